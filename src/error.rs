use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Single field failure in the `errors` array of a validation response.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": "Validation failed",
                    "errors": errors,
                }),
            ),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, envelope(message)),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, envelope(message)),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, envelope(message)),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, envelope(message)),
            AppError::Conflict(message) => (StatusCode::CONFLICT, envelope(message)),
            AppError::Database(inner) => {
                error!("Database error: {inner}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    envelope("Internal server error".to_string()),
                )
            }
            AppError::Internal(inner) => {
                error!("Internal error: {inner}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    envelope("Internal server error".to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn envelope(message: String) -> serde_json::Value {
    json!({
        "success": false,
        "message": message,
    })
}
