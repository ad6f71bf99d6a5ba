//! Environmental snapshot construction.
//!
//! Flattens a district's stored aggregates into the plain numeric readings
//! the prediction service consumes. Every field has a documented default,
//! so snapshot construction never fails.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{Location, StatSummary};

pub const DEFAULT_SOIL_PH: f64 = 6.5;
pub const DEFAULT_SOIL_ORGANIC_CARBON: f64 = 0.8;
pub const DEFAULT_SOIL_NITROGEN: f64 = 120.0;
pub const DEFAULT_SOIL_PHOSPHORUS: f64 = 25.0;
pub const DEFAULT_SOIL_POTASSIUM: f64 = 180.0;

/// Defaults for the stored-aggregate weather path. Rainfall here is a
/// seasonal total in mm, unlike the live path's hourly mean.
pub const STORED_DEFAULT_TEMPERATURE_C: f64 = 25.0;
pub const STORED_DEFAULT_RAINFALL_MM: f64 = 800.0;
pub const STORED_DEFAULT_HUMIDITY_PCT: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SoilSnapshot {
    pub ph: f64,
    pub organic_carbon: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub avg_temperature: f64,
    pub avg_rainfall: f64,
    pub avg_humidity: f64,
}

/// The soil and weather readings a recommendation was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentalSnapshot {
    pub soil: SoilSnapshot,
    pub weather: WeatherSnapshot,
}

fn mean_or(stat: Option<&StatSummary>, default: f64) -> f64 {
    stat.and_then(|s| s.mean).unwrap_or(default)
}

/// Soil snapshot from the stored per-district means.
pub fn soil_snapshot(location: &Location) -> SoilSnapshot {
    let soil = &location.soil_data.0;
    SoilSnapshot {
        ph: mean_or(soil.ph.as_ref(), DEFAULT_SOIL_PH),
        organic_carbon: mean_or(soil.organic_carbon.as_ref(), DEFAULT_SOIL_ORGANIC_CARBON),
        nitrogen: mean_or(soil.nitrogen.as_ref(), DEFAULT_SOIL_NITROGEN),
        phosphorus: mean_or(soil.phosphorus.as_ref(), DEFAULT_SOIL_PHOSPHORUS),
        potassium: mean_or(soil.potassium.as_ref(), DEFAULT_SOIL_POTASSIUM),
    }
}

/// Weather snapshot from the stored historical means.
pub fn stored_weather_snapshot(location: &Location) -> WeatherSnapshot {
    let weather = &location.weather_data.0;
    WeatherSnapshot {
        avg_temperature: mean_or(
            weather.avg_temperature.as_ref(),
            STORED_DEFAULT_TEMPERATURE_C,
        ),
        avg_rainfall: mean_or(weather.avg_rainfall.as_ref(), STORED_DEFAULT_RAINFALL_MM),
        avg_humidity: mean_or(weather.avg_humidity.as_ref(), STORED_DEFAULT_HUMIDITY_PCT),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::models::{SoilData, StatSummary, WeatherData};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    /// A location with no coordinates and no aggregates.
    pub(crate) fn bare_location(state: &str, district: &str) -> Location {
        Location {
            id: Uuid::new_v4(),
            state: state.to_string(),
            district: district.to_string(),
            latitude: None,
            longitude: None,
            soil_data: Json(SoilData::default()),
            weather_data: Json(WeatherData::default()),
            crop_yield_history: Json(Vec::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Pune with every soil and weather mean populated.
    pub(crate) fn pune_location() -> Location {
        let mut location = bare_location("Maharashtra", "Pune");
        location.soil_data = Json(SoilData {
            ph: Some(StatSummary {
                mean: Some(7.2),
                median: Some(7.1),
                std_dev: Some(0.3),
            }),
            organic_carbon: Some(StatSummary::with_mean(0.62)),
            nitrogen: Some(StatSummary::with_mean(210.0)),
            phosphorus: Some(StatSummary::with_mean(18.5)),
            potassium: Some(StatSummary::with_mean(320.0)),
            soil_type: Some("black".to_string()),
        });
        location.weather_data = Json(WeatherData {
            avg_temperature: Some(StatSummary::with_mean(26.4)),
            avg_rainfall: Some(StatSummary::with_mean(722.0)),
            avg_humidity: Some(StatSummary::with_mean(64.0)),
            last_updated: Some(Utc::now()),
        });
        location
    }

    #[test]
    fn test_soil_snapshot_uses_stored_means() {
        let soil = soil_snapshot(&pune_location());
        assert_eq!(
            soil,
            SoilSnapshot {
                ph: 7.2,
                organic_carbon: 0.62,
                nitrogen: 210.0,
                phosphorus: 18.5,
                potassium: 320.0,
            }
        );
    }

    #[test]
    fn test_soil_snapshot_defaults_when_empty() {
        let soil = soil_snapshot(&bare_location("Bihar", "Gaya"));
        assert_eq!(soil.ph, 6.5);
        assert_eq!(soil.organic_carbon, 0.8);
        assert_eq!(soil.nitrogen, 120.0);
        assert_eq!(soil.phosphorus, 25.0);
        assert_eq!(soil.potassium, 180.0);
    }

    #[test]
    fn test_soil_snapshot_summary_without_mean_uses_default() {
        let mut location = bare_location("Bihar", "Gaya");
        location.soil_data.0.ph = Some(StatSummary {
            mean: None,
            median: Some(7.9),
            std_dev: None,
        });
        location.soil_data.0.nitrogen = Some(StatSummary::with_mean(95.0));

        let soil = soil_snapshot(&location);
        assert_eq!(soil.ph, DEFAULT_SOIL_PH);
        assert_eq!(soil.nitrogen, 95.0);
        assert_eq!(soil.potassium, DEFAULT_SOIL_POTASSIUM);
    }

    #[test]
    fn test_stored_weather_snapshot_verbatim() {
        let weather = stored_weather_snapshot(&pune_location());
        assert_eq!(weather.avg_temperature, 26.4);
        assert_eq!(weather.avg_rainfall, 722.0);
        assert_eq!(weather.avg_humidity, 64.0);
    }

    #[test]
    fn test_stored_weather_snapshot_defaults() {
        let weather = stored_weather_snapshot(&bare_location("Bihar", "Gaya"));
        assert_eq!(weather.avg_temperature, 25.0);
        assert_eq!(weather.avg_rainfall, 800.0);
        assert_eq!(weather.avg_humidity, 60.0);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = EnvironmentalSnapshot {
            soil: soil_snapshot(&bare_location("Bihar", "Gaya")),
            weather: stored_weather_snapshot(&bare_location("Bihar", "Gaya")),
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["soil"]["organicCarbon"], 0.8);
        assert_eq!(json["weather"]["avgRainfall"], 800.0);
    }
}
