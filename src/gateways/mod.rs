// src/gateways/mod.rs

pub mod gemini;

use std::fmt;

use async_trait::async_trait;

use crate::models::{question::Question, quiz_config::QuizConfig};

/// Turns a quiz configuration into an ordered list of questions.
///
/// Implementations must either return well-formed questions (four distinct
/// options, answer among them, non-empty text) or fail outright.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, config: &QuizConfig) -> Result<Vec<Question>, GatewayError>;
}

/// Produces a short advisory comment on a finished quiz.
#[async_trait]
pub trait FeedbackProvider: Send + Sync {
    async fn comment(&self, score: usize, total: usize, topic: &str)
    -> Result<String, GatewayError>;
}

/// Failure inside a gateway implementation.
#[derive(Debug)]
pub enum GatewayError {
    // Transport failure: connect, timeout, body decoding
    Http(reqwest::Error),

    // Non-2xx answer from the service
    Status { status: u16, body: String },

    // Content arrived but is not what was asked for
    Malformed(String),

    // Service answered with nothing usable
    Empty,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Http(e) => write!(f, "request failed: {}", e),
            GatewayError::Status { status, body } => {
                write!(f, "service answered {}: {}", status, body)
            }
            GatewayError::Malformed(reason) => write!(f, "malformed content: {}", reason),
            GatewayError::Empty => write!(f, "service returned no content"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Http(err)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Malformed(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::Malformed(err.to_string())
    }
}
