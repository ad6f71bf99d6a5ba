use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::services::prediction::PredictionClient;

/// Dependencies checked by the health endpoint.
#[derive(Clone)]
pub(crate) struct HealthState {
    pub(crate) pool: PgPool,
    pub(crate) predictor: PredictionClient,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when every dependency answers, "degraded" otherwise
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the database is reachable
    pub database: bool,
    /// Whether the prediction service answers its health endpoint
    pub prediction_service: bool,
}

fn overall_status(database: bool, prediction_service: bool) -> &'static str {
    if database && prediction_service {
        "ok"
    } else {
        "degraded"
    }
}

/// Health check endpoint.
///
/// Always 200; a failing dependency only marks the status "degraded".
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let (database, prediction_service) = tokio::join!(
        async {
            sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(&state.pool)
                .await
                .is_ok()
        },
        state.predictor.health(),
    );

    Json(HealthResponse {
        status: overall_status(database, prediction_service).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        prediction_service,
    })
}
