//! Client for the crop prediction service.
//!
//! The service is a black box: we send the normalised environmental payload
//! and receive ranked candidates. Any failure to get a usable answer is a
//! transient `ServiceUnavailable`; the caller decides whether to retry.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::db::models::Season;
use crate::errors::AppError;
use crate::services::snapshot::{SoilSnapshot, WeatherSnapshot};

const PREDICT_PATH: &str = "/predict";
const HEALTH_PATH: &str = "/health";

/// Message surfaced to callers when the service cannot be used.
pub const PREDICTION_UNAVAILABLE: &str = "Prediction service unavailable. Please try again later.";

/// Request body for `POST /predict`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub state: String,
    pub district: String,
    pub season: Season,
    pub soil: SoilSnapshot,
    pub weather: WeatherSnapshot,
}

/// Expected yield range in kg/hectare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct YieldPrediction {
    pub min: f64,
    pub max: f64,
    pub expected: f64,
}

/// Per-factor match scores (0-100) behind a suitability score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentalFactors {
    pub soil_match: f64,
    pub weather_match: f64,
    pub historical_yield: f64,
}

/// One ranked candidate returned by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedCrop {
    pub crop_name: String,
    #[serde(default)]
    pub suitability_score: f64,
    #[serde(default)]
    pub yield_prediction: YieldPrediction,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub environmental_factors: EnvironmentalFactors,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    recommendations: Vec<PredictedCrop>,
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: reqwest::Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to build prediction client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Ask the service for ranked crop candidates. Ranking order is preserved.
    pub async fn predict(&self, payload: &PredictionRequest) -> Result<Vec<PredictedCrop>, AppError> {
        let url = format!("{}{}", self.base_url, PREDICT_PATH);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::error!("Prediction service timed out: {}", e);
                } else {
                    tracing::error!("Prediction service request failed: {}", e);
                }
                unavailable()
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Prediction service returned {}: {}", status, body);
            return Err(unavailable());
        }

        let parsed: PredictionResponse = response.json().await.map_err(|e| {
            tracing::error!("Prediction service response parse error: {}", e);
            unavailable()
        })?;

        Ok(parsed.recommendations)
    }

    /// Whether the service answers its health endpoint.
    pub async fn health(&self) -> bool {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Prediction service health check failed: {}", e);
                false
            }
        }
    }
}

fn unavailable() -> AppError {
    AppError::ServiceUnavailable(PREDICTION_UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> PredictionRequest {
        PredictionRequest {
            state: "Maharashtra".to_string(),
            district: "Pune".to_string(),
            season: Season::Kharif,
            soil: SoilSnapshot {
                ph: 7.2,
                organic_carbon: 0.62,
                nitrogen: 210.0,
                phosphorus: 18.5,
                potassium: 320.0,
            },
            weather: WeatherSnapshot {
                avg_temperature: 26.4,
                avg_rainfall: 722.0,
                avg_humidity: 64.0,
            },
        }
    }

    fn client(server: &MockServer, timeout: Duration) -> PredictionClient {
        PredictionClient::new(&server.uri(), timeout).unwrap()
    }

    #[test]
    fn test_payload_wire_format() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["season"], "Kharif");
        assert_eq!(json["soil"]["organicCarbon"], 0.62);
        assert_eq!(json["weather"]["avgTemperature"], 26.4);
        assert_eq!(json["weather"]["avgHumidity"], 64.0);
    }

    #[tokio::test]
    async fn test_predict_parses_candidates_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_partial_json(serde_json::json!({
                "state": "Maharashtra",
                "district": "Pune",
                "season": "Kharif",
                "soil": { "ph": 7.2, "nitrogen": 210.0 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "recommendations": [
                    {
                        "cropName": "Soybean",
                        "suitabilityScore": 88.5,
                        "yieldPrediction": { "min": 1600.0, "max": 2400.0, "expected": 2000.0 },
                        "explanation": "Soybean is highly suitable for your location.",
                        "environmentalFactors": { "soilMatch": 90.0, "weatherMatch": 85.0, "historicalYield": 80.0 }
                    },
                    {
                        "cropName": "Rice",
                        "suitabilityScore": 72.0,
                        "yieldPrediction": { "min": 2800.0, "max": 4200.0, "expected": 3500.0 },
                        "explanation": "Rice is suitable for your location.",
                        "environmentalFactors": { "soilMatch": 70.0, "weatherMatch": 75.0, "historicalYield": 60.0 }
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let predictions = client(&server, Duration::from_secs(2))
            .predict(&payload())
            .await
            .unwrap();

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].crop_name, "Soybean");
        assert_eq!(predictions[0].yield_prediction.expected, 2000.0);
        assert_eq!(predictions[0].environmental_factors.soil_match, 90.0);
        assert_eq!(predictions[1].crop_name, "Rice");
    }

    #[tokio::test]
    async fn test_missing_recommendations_field_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let predictions = client(&server, Duration::from_secs(2))
            .predict(&payload())
            .await
            .unwrap();
        assert!(predictions.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Prediction error"))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(2))
            .predict(&payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_timeout_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "recommendations": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_millis(50))
            .predict(&payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(2))
            .predict(&payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_is_service_unavailable() {
        // Nothing listens on port 1.
        let err = PredictionClient::new("http://127.0.0.1:1", Duration::from_secs(1))
            .unwrap()
            .predict(&payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_health_reports_service_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "healthy" })),
            )
            .mount(&server)
            .await;

        assert!(client(&server, Duration::from_secs(2)).health().await);
    }
}
