use std::any::Any;

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::validator::MalformedResponseError;
use crate::gemini_client::ServiceCallError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    ServiceCall(#[from] ServiceCallError),

    #[error(transparent)]
    MalformedResponse(#[from] MalformedResponseError),

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ServiceCall(e) => {
                tracing::error!("Gemini service error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::MalformedResponse(e) => {
                tracing::error!("Malformed AI response: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.public_message().to_string(),
                )
            }
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {e}");
                (e.status(), e.body_text())
            }
        };

        error_response(status, message)
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Last-resort handler for panics escaping a route handler.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {message}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}
