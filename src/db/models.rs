use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::reconcile::RecommendationEntry;
use crate::services::snapshot::EnvironmentalSnapshot;

/// Growing season a recommendation is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Season {
    Kharif,
    Rabi,
    Zaid,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Kharif => "Kharif",
            Season::Rabi => "Rabi",
            Season::Zaid => "Zaid",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Kharif" => Ok(Season::Kharif),
            "Rabi" => Ok(Season::Rabi),
            "Zaid" => Ok(Season::Zaid),
            other => Err(format!(
                "season must be one of Kharif, Rabi, Zaid (got '{}')",
                other
            )),
        }
    }
}

/// Distribution summary of one aggregated measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatSummary {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
}

impl StatSummary {
    #[cfg(test)]
    pub fn with_mean(mean: f64) -> Self {
        Self {
            mean: Some(mean),
            ..Self::default()
        }
    }
}

/// Aggregated soil statistics for a district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SoilData {
    pub ph: Option<StatSummary>,
    pub organic_carbon: Option<StatSummary>,
    pub nitrogen: Option<StatSummary>,
    pub phosphorus: Option<StatSummary>,
    pub potassium: Option<StatSummary>,
    pub soil_type: Option<String>,
}

/// Aggregated historical weather statistics for a district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherData {
    pub avg_temperature: Option<StatSummary>,
    pub avg_rainfall: Option<StatSummary>,
    pub avg_humidity: Option<StatSummary>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// One row of a district's historical yield log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct YieldRecord {
    pub crop: Option<Uuid>,
    pub season: String,
    pub year: i32,
    /// kg/hectare
    #[serde(rename = "yield")]
    pub yield_kg_per_ha: f64,
    /// hectares
    #[serde(rename = "area")]
    pub area_ha: f64,
}

/// A district with its processed environmental aggregates.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; some accessed only via route serialization
pub struct Location {
    pub id: Uuid,
    pub state: String,
    pub district: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub soil_data: Json<SoilData>,
    pub weather_data: Json<WeatherData>,
    pub crop_yield_history: Json<Vec<YieldRecord>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog crop.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; some accessed only via route serialization
pub struct Crop {
    pub id: Uuid,
    pub name: String,
    pub scientific_name: Option<String>,
    /// Kharif, Rabi, Zaid or All
    pub season: String,
    pub description: Option<String>,
    pub min_temperature: Option<Decimal>,
    pub max_temperature: Option<Decimal>,
    pub min_rainfall: Option<Decimal>,
    pub max_rainfall: Option<Decimal>,
    pub ph_min: Option<Decimal>,
    pub ph_max: Option<Decimal>,
    pub soil_types: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted recommendation run (append-only audit record).
#[derive(Debug, Clone, FromRow)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: String,
    pub district: String,
    pub season: String,
    pub recommendations: Json<Vec<RecommendationEntry>>,
    pub environmental_snapshot: Json<EnvironmentalSnapshot>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for inserting a new recommendation record.
#[derive(Debug, Clone)]
pub struct NewRecommendation {
    pub user_id: Uuid,
    pub state: String,
    pub district: String,
    pub season: Season,
    pub recommendations: Vec<RecommendationEntry>,
    pub environmental_snapshot: EnvironmentalSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_round_trip() {
        for season in [Season::Kharif, Season::Rabi, Season::Zaid] {
            assert_eq!(season.as_str().parse::<Season>().unwrap(), season);
        }
    }

    #[test]
    fn test_season_rejects_unknown() {
        assert!("kharif".parse::<Season>().is_err());
        assert!("All".parse::<Season>().is_err());
        assert!("".parse::<Season>().is_err());
    }

    #[test]
    fn test_soil_data_deserializes_partial_document() {
        let soil: SoilData = serde_json::from_value(serde_json::json!({
            "ph": { "mean": 7.1, "median": 7.0, "stdDev": 0.4 },
            "soilType": "black"
        }))
        .unwrap();
        assert_eq!(soil.ph.as_ref().and_then(|s| s.mean), Some(7.1));
        assert_eq!(soil.ph.as_ref().and_then(|s| s.std_dev), Some(0.4));
        assert!(soil.nitrogen.is_none());
        assert_eq!(soil.soil_type.as_deref(), Some("black"));
    }

    #[test]
    fn test_yield_record_field_names() {
        let record: YieldRecord = serde_json::from_value(serde_json::json!({
            "crop": null,
            "season": "Kharif",
            "year": 2022,
            "yield": 2450.0,
            "area": 1200.5
        }))
        .unwrap();
        assert_eq!(record.yield_kg_per_ha, 2450.0);
        assert_eq!(record.area_ha, 1200.5);
    }
}
