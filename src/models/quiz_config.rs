// src/models/quiz_config.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::DEFAULT_QUESTION_COUNT;

/// How hard the generated questions should be.
///
/// Portuguese labels (`básica`, `intermediária`, `avançada`) are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "básica", alias = "basica")]
    Basic,
    #[default]
    #[serde(alias = "intermediária", alias = "intermediaria")]
    Intermediate,
    #[serde(alias = "avançada", alias = "avancada")]
    Advanced,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Basic => "basic",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// Setup chosen by the player. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuizConfig {
    #[validate(length(max = 200), custom(function = validate_topic))]
    pub topic: String,

    #[serde(default)]
    pub difficulty: Difficulty,

    /// Number of questions to request, between 3 and 15.
    #[serde(default = "default_count")]
    #[validate(range(min = 3, max = 15))]
    pub count: u32,
}

impl QuizConfig {
    pub fn new(topic: impl Into<String>, difficulty: Difficulty, count: u32) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
            count,
        }
    }
}

fn default_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

fn validate_topic(topic: &str) -> Result<(), validator::ValidationError> {
    if topic.trim().is_empty() {
        return Err(validator::ValidationError::new("topic_cannot_be_empty"));
    }
    Ok(())
}
