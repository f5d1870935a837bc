// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Covers every way a quiz operation can fail and maps each to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request: empty topic, count out of range, ...
    InvalidConfig(String),

    // 502 Bad Gateway: the question source failed or returned invalid data
    GenerationFailed(String),

    // 502 Bad Gateway: the commentary source failed (absorbed by the session)
    FeedbackFailed(String),

    // 409 Conflict: operation not allowed in the current state
    InvalidTransition(String),

    // 409 Conflict: a restart landed while the gateway call was in flight
    Superseded,

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    /// Stable machine-readable kind, sent next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidConfig(_) => "invalid_config",
            AppError::GenerationFailed(_) => "generation_failed",
            AppError::FeedbackFailed(_) => "feedback_failed",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::Superseded => "superseded",
            AppError::InternalServerError(_) => "internal",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            AppError::InvalidConfig(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::GenerationFailed(msg) => {
                tracing::error!("Question generation failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate the quiz: the content source could not be reached or returned invalid data."
                        .to_string(),
                )
            }
            AppError::FeedbackFailed(msg) => {
                tracing::warn!("Feedback generation failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate feedback.".to_string(),
                )
            }
            AppError::InvalidTransition(msg) => {
                tracing::warn!("Rejected transition: {}", msg);
                (StatusCode::CONFLICT, msg)
            }
            AppError::Superseded => (
                StatusCode::CONFLICT,
                "The session was restarted while this request was in flight.".to_string(),
            ),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// A start body that does not even deserialize is a malformed config.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidConfig(rejection.body_text())
    }
}
