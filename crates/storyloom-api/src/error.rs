//! Storyloom API — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use storyloom_core::error::PlayerError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The story library could not be prepared.
    #[error("library error: {0}")]
    Library(#[from] PlayerError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `PlayerError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub PlayerError);

impl From<PlayerError> for ApiError {
    fn from(err: PlayerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            PlayerError::NotFound(_) | PlayerError::NoSavedProgress(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            PlayerError::Validation(_) | PlayerError::InvalidChoice { .. } => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            PlayerError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
            PlayerError::StoryPayload(_) | PlayerError::MalformedSave(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_payload")
            }
            PlayerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
