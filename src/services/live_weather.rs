//! Live weather from the Open-Meteo forecast API.
//!
//! Averages the hourly series over a window of 2 past days and 3 forecast
//! days. Missing series degrade to fixed defaults; only a failed request is
//! an error.
//! See: https://open-meteo.com/en/docs

use serde::Deserialize;
use std::time::Duration;

use crate::errors::AppError;
use crate::helpers::mean;
use crate::services::geocoding::Coordinates;
use crate::services::snapshot::WeatherSnapshot;

const FORECAST_PATH: &str = "/v1/forecast";

const HOURLY_VARIABLES: &str = "temperature_2m,relativehumidity_2m,precipitation";
const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";
const PAST_DAYS: &str = "2";
const FORECAST_DAYS: &str = "3";

/// Defaults for the live path. Rainfall is an hourly mean in mm, so it is
/// much smaller than the stored-aggregate default.
pub const LIVE_DEFAULT_TEMPERATURE_C: f64 = 25.0;
pub const LIVE_DEFAULT_RAINFALL_MM: f64 = 5.0;
pub const LIVE_DEFAULT_HUMIDITY_PCT: f64 = 60.0;

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    hourly: Option<HourlySeries>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlySeries {
    temperature_2m: Vec<Option<f64>>,
    #[serde(alias = "relative_humidity_2m")]
    relativehumidity_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
}

/// Client for live weather averages.
#[derive(Debug, Clone)]
pub struct LiveWeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl LiveWeatherClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build weather client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch recent and short-term forecast averages for `coords`.
    pub async fn fetch(&self, coords: Coordinates) -> Result<WeatherSnapshot, AppError> {
        let url = format!("{}{}", self.base_url, FORECAST_PATH);
        let latitude = coords.latitude.to_string();
        let longitude = coords.longitude.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("hourly", HOURLY_VARIABLES),
                ("daily", DAILY_VARIABLES),
                ("past_days", PAST_DAYS),
                ("forecast_days", FORECAST_DAYS),
                ("timezone", "auto"),
            ])
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                AppError::ExternalServiceError(format!("Weather request {}: {}", kind, e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Weather service returned HTTP {}",
                response.status()
            )));
        }

        let body: ForecastResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Weather response parse error: {}", e))
        })?;

        Ok(summarise(body.hourly.unwrap_or_default()))
    }
}

fn summarise(hourly: HourlySeries) -> WeatherSnapshot {
    let avg_temperature = mean(&hourly.temperature_2m).unwrap_or_else(|| {
        tracing::debug!("Empty hourly temperature series, using default");
        LIVE_DEFAULT_TEMPERATURE_C
    });
    let avg_rainfall = mean(&hourly.precipitation).unwrap_or_else(|| {
        tracing::debug!("Empty hourly precipitation series, using default");
        LIVE_DEFAULT_RAINFALL_MM
    });
    let avg_humidity = mean(&hourly.relativehumidity_2m).unwrap_or_else(|| {
        tracing::debug!("Empty hourly humidity series, using default");
        LIVE_DEFAULT_HUMIDITY_PCT
    });

    WeatherSnapshot {
        avg_temperature,
        avg_rainfall,
        avg_humidity,
    }
}
