//! Location data endpoints.
//!
//! - GET /api/v1/locations/states
//! - GET /api/v1/locations/districts/:state
//! - GET /api/v1/locations/:state/:district

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{self, SoilData, WeatherData, YieldRecord};
use crate::db::queries;
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::opt_dec_to_f64;

/// Stored agro data for one district.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub id: Uuid,
    pub state: String,
    pub district: String,
    /// Latitude (WGS84), if known
    pub latitude: Option<f64>,
    /// Longitude (WGS84), if known
    pub longitude: Option<f64>,
    pub soil_data: SoilData,
    pub weather_data: WeatherData,
    pub crop_yield_history: Vec<YieldRecord>,
    /// Last ingestion time in RFC 3339 format
    pub updated_at: String,
}

impl From<models::Location> for LocationResponse {
    fn from(l: models::Location) -> Self {
        Self {
            id: l.id,
            state: l.state,
            district: l.district,
            latitude: opt_dec_to_f64(l.latitude),
            longitude: opt_dec_to_f64(l.longitude),
            soil_data: l.soil_data.0,
            weather_data: l.weather_data.0,
            crop_yield_history: l.crop_yield_history.0,
            updated_at: l.updated_at.to_rfc3339(),
        }
    }
}

/// List states that have processed location data.
#[utoipa::path(
    get,
    path = "/api/v1/locations/states",
    tag = "Locations",
    responses(
        (status = 200, description = "States in alphabetical order", body = Vec<String>),
    )
)]
pub async fn list_states(State(pool): State<PgPool>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(queries::list_states(&pool).await?))
}

/// List districts with processed data for a state.
#[utoipa::path(
    get,
    path = "/api/v1/locations/districts/{state}",
    tag = "Locations",
    params(
        ("state" = String, Path, description = "State name (case-insensitive)"),
    ),
    responses(
        (status = 200, description = "Districts in alphabetical order", body = Vec<String>),
        (status = 404, description = "No districts for this state", body = ErrorResponse),
    )
)]
pub async fn list_districts(
    State(pool): State<PgPool>,
    Path(state): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let districts = queries::list_districts(&pool, state.trim()).await?;
    if districts.is_empty() {
        return Err(AppError::NotFound(format!(
            "No districts found for state {}",
            state
        )));
    }
    Ok(Json(districts))
}

/// Get the stored soil, weather and yield aggregates for a district.
#[utoipa::path(
    get,
    path = "/api/v1/locations/{state}/{district}",
    tag = "Locations",
    params(
        ("state" = String, Path, description = "State name"),
        ("district" = String, Path, description = "District name"),
    ),
    responses(
        (status = 200, description = "Location data", body = LocationResponse),
        (status = 404, description = "Location not found", body = ErrorResponse),
    )
)]
pub async fn get_location(
    State(pool): State<PgPool>,
    Path((state, district)): Path<(String, String)>,
) -> Result<Json<LocationResponse>, AppError> {
    let location = queries::get_location(&pool, state.trim(), district.trim())
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Location data not found for {}, {}", district, state))
        })?;
    Ok(Json(LocationResponse::from(location)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::snapshot::tests::pune_location;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_location_response_from_model() {
        let mut location = pune_location();
        location.latitude = Some(Decimal::from_str("18.5204").unwrap());

        let response = LocationResponse::from(location);
        assert_eq!(response.latitude, Some(18.5204));
        assert_eq!(response.longitude, None);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["soilData"]["ph"]["mean"], 7.2);
        assert_eq!(json["weatherData"]["avgRainfall"]["mean"], 722.0);
        assert!(json["cropYieldHistory"].as_array().unwrap().is_empty());
    }
}
