use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flightwatch_core::CoreError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UpstreamError(String),
    UpstreamTimeout(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UpstreamError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::UpstreamTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let msg = err.to_string();
        match err {
            CoreError::InvalidRange(_) | CoreError::ValidationError(_) => AppError::ValidationError(msg),
            CoreError::NotFound { .. } | CoreError::WatchNotFound(_) => AppError::NotFoundError(msg),
            CoreError::WatchDisabled(_) => AppError::ConflictError(msg),
            CoreError::UpstreamSearch { .. } | CoreError::Authentication(_) => AppError::UpstreamError(msg),
            CoreError::UpstreamTimeout(_) => AppError::UpstreamTimeout(msg),
            CoreError::MalformedOffer(_) | CoreError::Storage(_) => AppError::InternalServerError(msg),
        }
    }
}
