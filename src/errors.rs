use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Coordinates for a district could not be resolved by the geocoder.
    #[error("Upstream resolution error: {0}")]
    UpstreamResolution(String),

    /// The live weather provider failed to answer.
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// The prediction service is unreachable, erroring, or timed out.
    /// Transient: callers may retry the whole request.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    /// HTTP status class used when this error reaches a handler boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamResolution(_) | AppError::ExternalServiceError(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::UpstreamResolution(msg)
            | AppError::ExternalServiceError(msg)
            | AppError::ServiceUnavailable(msg) => msg.clone(),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                msg.clone()
            }
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                "Internal database error".to_string()
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}
