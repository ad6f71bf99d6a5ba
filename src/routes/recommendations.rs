//! Recommendation HTTP endpoints.
//!
//! - POST /api/v1/recommendations            (stored weather)
//! - POST /api/v1/recommendations/generate   (live weather)
//! - GET  /api/v1/recommendations            (caller's history)
//! - GET  /api/v1/recommendations/:id

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models;
use crate::db::store::RecommendationStore;
use crate::errors::{AppError, ErrorResponse};
use crate::services::recommendation::{RecommendationOutcome, RecommendationPipeline};
use crate::services::reconcile::RecommendationEntry;
use crate::services::snapshot::EnvironmentalSnapshot;

/// Header set by the auth gateway with the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

const HISTORY_LIMIT: i64 = 20;

/// Shared state for recommendation endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pipeline: RecommendationPipeline,
    pub(crate) records: Arc<dyn RecommendationStore>,
}

/// Request body for both recommendation endpoints.
///
/// Absent and null fields are both read as empty, so the pipeline reports
/// them as validation errors.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecommendationBody {
    pub state: Option<String>,
    pub district: Option<String>,
    /// Kharif, Rabi or Zaid
    pub season: Option<String>,
}

impl RecommendationBody {
    fn fields(&self) -> (&str, &str, &str) {
        (
            self.state.as_deref().unwrap_or_default(),
            self.district.as_deref().unwrap_or_default(),
            self.season.as_deref().unwrap_or_default(),
        )
    }
}

/// Unwrap a JSON body, reporting undecodable bodies as validation errors.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// A stored recommendation record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    pub id: Uuid,
    pub state: String,
    pub district: String,
    pub season: String,
    pub recommendations: Vec<RecommendationEntry>,
    pub environmental_snapshot: EnvironmentalSnapshot,
    /// RFC 3339
    pub created_at: String,
}

impl From<models::Recommendation> for RecommendationRecord {
    fn from(r: models::Recommendation) -> Self {
        Self {
            id: r.id,
            state: r.state,
            district: r.district,
            season: r.season,
            recommendations: r.recommendations.0,
            environmental_snapshot: r.environmental_snapshot.0,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing user identity".to_string()))?;
    value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid user identity".to_string()))
}

/// Recommend crops using the district's stored weather aggregates.
#[utoipa::path(
    post,
    path = "/api/v1/recommendations",
    tag = "Recommendations",
    request_body = RecommendationBody,
    params(
        ("x-user-id" = Uuid, Header, description = "Caller's user id"),
    ),
    responses(
        (status = 200, description = "Ranked recommendations", body = RecommendationOutcome),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Missing user identity", body = ErrorResponse),
        (status = 404, description = "No processed data for this district", body = ErrorResponse),
        (status = 503, description = "Prediction service unavailable", body = ErrorResponse),
    )
)]
pub async fn create_recommendation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RecommendationBody>, JsonRejection>,
) -> Result<Json<RecommendationOutcome>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let body = json_body(body)?;
    let (state_name, district, season) = body.fields();
    let outcome = state
        .pipeline
        .get_cached_recommendations(user_id, state_name, district, season)
        .await?;
    Ok(Json(outcome))
}

/// Recommend crops using live weather at the district's coordinates.
#[utoipa::path(
    post,
    path = "/api/v1/recommendations/generate",
    tag = "Recommendations",
    request_body = RecommendationBody,
    params(
        ("x-user-id" = Uuid, Header, description = "Caller's user id"),
    ),
    responses(
        (status = 200, description = "Ranked recommendations", body = RecommendationOutcome),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Missing user identity", body = ErrorResponse),
        (status = 404, description = "No processed data for this district", body = ErrorResponse),
        (status = 502, description = "Geocoding or weather provider failed", body = ErrorResponse),
        (status = 503, description = "Prediction service unavailable", body = ErrorResponse),
    )
)]
pub async fn generate_recommendation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RecommendationBody>, JsonRejection>,
) -> Result<Json<RecommendationOutcome>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let body = json_body(body)?;
    let (state_name, district, season) = body.fields();
    let outcome = state
        .pipeline
        .get_live_recommendations(user_id, state_name, district, season)
        .await?;
    Ok(Json(outcome))
}

/// The caller's most recent recommendation records, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/recommendations",
    tag = "Recommendations",
    params(
        ("x-user-id" = Uuid, Header, description = "Caller's user id"),
    ),
    responses(
        (status = 200, description = "Recommendation history", body = Vec<RecommendationRecord>),
        (status = 401, description = "Missing user identity", body = ErrorResponse),
    )
)]
pub async fn list_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RecommendationRecord>>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let records = state.records.list_for_user(user_id, HISTORY_LIMIT).await?;
    Ok(Json(
        records.into_iter().map(RecommendationRecord::from).collect(),
    ))
}

/// Get one recommendation record owned by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/recommendations/{id}",
    tag = "Recommendations",
    params(
        ("id" = Uuid, Path, description = "Recommendation UUID"),
        ("x-user-id" = Uuid, Header, description = "Caller's user id"),
    ),
    responses(
        (status = 200, description = "Recommendation record", body = RecommendationRecord),
        (status = 401, description = "Missing user identity", body = ErrorResponse),
        (status = 403, description = "Record belongs to another user", body = ErrorResponse),
        (status = 404, description = "Recommendation not found", body = ErrorResponse),
    )
)]
pub async fn get_recommendation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<RecommendationRecord>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let record = state
        .records
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recommendation {} not found", id)))?;
    if record.user_id != user_id {
        return Err(AppError::Forbidden(
            "Not authorized to view this recommendation".to_string(),
        ));
    }
    Ok(Json(RecommendationRecord::from(record)))
}
