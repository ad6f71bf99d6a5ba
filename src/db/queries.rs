use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Crop, Location, NewRecommendation, Recommendation};

const LOCATION_COLUMNS: &str = "id, state, district, latitude, longitude,
    soil_data, weather_data, crop_yield_history, created_at, updated_at";

const CROP_COLUMNS: &str = "id, name, scientific_name, season, description,
    min_temperature, max_temperature, min_rainfall, max_rainfall, ph_min, ph_max,
    soil_types, image_url, created_at, updated_at";

const RECOMMENDATION_COLUMNS: &str = "id, user_id, state, district, season,
    recommendations, environmental_snapshot, created_at";

/// Get the location for an exact (state, district) pair.
pub async fn get_location(
    pool: &PgPool,
    state: &str,
    district: &str,
) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE state = $1 AND district = $2"
    ))
    .bind(state)
    .bind(district)
    .fetch_optional(pool)
    .await
}

/// Distinct states that have processed location data, alphabetically.
pub async fn list_states(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT DISTINCT state FROM locations ORDER BY state")
        .fetch_all(pool)
        .await
}

/// Districts with processed data for a state (case-insensitive state match).
pub async fn list_districts(pool: &PgPool, state: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT district FROM locations
         WHERE LOWER(state) = LOWER($1)
         ORDER BY district",
    )
    .bind(state)
    .fetch_all(pool)
    .await
}

/// Get a crop by its exact catalog name.
pub async fn get_crop_by_name(pool: &PgPool, name: &str) -> Result<Option<Crop>, sqlx::Error> {
    sqlx::query_as::<_, Crop>(&format!("SELECT {CROP_COLUMNS} FROM crops WHERE name = $1"))
        .bind(name)
        .fetch_optional(pool)
        .await
}

/// Get a crop by ID.
pub async fn get_crop(pool: &PgPool, id: Uuid) -> Result<Option<Crop>, sqlx::Error> {
    sqlx::query_as::<_, Crop>(&format!("SELECT {CROP_COLUMNS} FROM crops WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// List catalog crops ordered by name, optionally restricted to one season label.
pub async fn list_crops(pool: &PgPool, season: Option<&str>) -> Result<Vec<Crop>, sqlx::Error> {
    sqlx::query_as::<_, Crop>(&format!(
        "SELECT {CROP_COLUMNS} FROM crops
         WHERE ($1::TEXT IS NULL OR season = $1)
         ORDER BY name"
    ))
    .bind(season)
    .fetch_all(pool)
    .await
}

/// Insert a new recommendation record (append-only).
pub async fn insert_recommendation(
    pool: &PgPool,
    params: &NewRecommendation,
) -> Result<Recommendation, sqlx::Error> {
    sqlx::query_as::<_, Recommendation>(&format!(
        "INSERT INTO recommendations (
            id, user_id, state, district, season,
            recommendations, environmental_snapshot, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING {RECOMMENDATION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(params.user_id)
    .bind(&params.state)
    .bind(&params.district)
    .bind(params.season.as_str())
    .bind(Json(&params.recommendations))
    .bind(Json(&params.environmental_snapshot))
    .fetch_one(pool)
    .await
}

/// A user's most recent recommendation records, newest first.
pub async fn list_recommendations_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Recommendation>, sqlx::Error> {
    sqlx::query_as::<_, Recommendation>(&format!(
        "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Get a single recommendation record by ID.
pub async fn get_recommendation(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Recommendation>, sqlx::Error> {
    sqlx::query_as::<_, Recommendation>(&format!(
        "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
