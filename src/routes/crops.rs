use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::models::{self, Season};
use crate::db::queries;
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::opt_dec_to_f64;

/// Catalog label for crops grown in every season.
const ALL_SEASONS: &str = "All";

#[derive(Debug, Deserialize, IntoParams)]
pub struct CropQuery {
    /// Restrict to one season label: Kharif, Rabi, Zaid or All
    pub season: Option<String>,
}

/// Response type for the crop catalog endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CropResponse {
    pub id: Uuid,
    pub name: String,
    pub scientific_name: Option<String>,
    /// Kharif, Rabi, Zaid or All
    pub season: String,
    pub description: Option<String>,
    /// Celsius
    pub min_temperature: Option<f64>,
    /// Celsius
    pub max_temperature: Option<f64>,
    /// mm per season
    pub min_rainfall: Option<f64>,
    /// mm per season
    pub max_rainfall: Option<f64>,
    pub ph_min: Option<f64>,
    pub ph_max: Option<f64>,
    pub soil_types: Vec<String>,
    pub image_url: Option<String>,
}

impl From<models::Crop> for CropResponse {
    fn from(c: models::Crop) -> Self {
        Self {
            id: c.id,
            name: c.name,
            scientific_name: c.scientific_name,
            season: c.season,
            description: c.description,
            min_temperature: opt_dec_to_f64(c.min_temperature),
            max_temperature: opt_dec_to_f64(c.max_temperature),
            min_rainfall: opt_dec_to_f64(c.min_rainfall),
            max_rainfall: opt_dec_to_f64(c.max_rainfall),
            ph_min: opt_dec_to_f64(c.ph_min),
            ph_max: opt_dec_to_f64(c.ph_max),
            soil_types: c.soil_types,
            image_url: c.image_url,
        }
    }
}

/// Validated season filter; `None` means no filter.
fn season_filter(query: &CropQuery) -> Result<Option<String>, AppError> {
    match query.season.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(ALL_SEASONS) => Ok(Some(ALL_SEASONS.to_string())),
        Some(label) => {
            let season: Season = label.parse().map_err(AppError::Validation)?;
            Ok(Some(season.to_string()))
        }
    }
}

/// List catalog crops, optionally filtered by season.
#[utoipa::path(
    get,
    path = "/api/v1/crops",
    tag = "Crops",
    params(CropQuery),
    responses(
        (status = 200, description = "Crops ordered by name", body = Vec<CropResponse>),
        (status = 400, description = "Unknown season", body = ErrorResponse),
    )
)]
pub async fn list_crops(
    State(pool): State<PgPool>,
    Query(query): Query<CropQuery>,
) -> Result<Json<Vec<CropResponse>>, AppError> {
    let season = season_filter(&query)?;
    let crops = queries::list_crops(&pool, season.as_deref()).await?;
    Ok(Json(crops.into_iter().map(CropResponse::from).collect()))
}

/// Get one catalog crop.
#[utoipa::path(
    get,
    path = "/api/v1/crops/{id}",
    tag = "Crops",
    params(
        ("id" = Uuid, Path, description = "Crop UUID"),
    ),
    responses(
        (status = 200, description = "Crop details", body = CropResponse),
        (status = 404, description = "Crop not found", body = ErrorResponse),
    )
)]
pub async fn get_crop(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<CropResponse>, AppError> {
    let crop = queries::get_crop(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Crop {} not found", id)))?;
    Ok(Json(CropResponse::from(crop)))
}
