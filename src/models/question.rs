// src/models/question.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::OPTIONS_PER_QUESTION;

/// A single multiple-choice question, as handed to the session by a generator.
/// The session never reorders or mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique within a session.
    pub id: String,

    /// The text of the question.
    pub question: String,

    /// Exactly four distinct options, in display order.
    pub options: Vec<String>,

    /// Equal to exactly one element of `options`.
    pub correct_answer: String,

    /// Why the correct answer is correct; shown after answering.
    pub explanation: String,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            options,
            correct_answer: correct_answer.into(),
            explanation: explanation.into(),
        }
    }

    /// Strict string matching against the answer key.
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.correct_answer
    }
}

/// DTO for sending the current question to a client (excludes answer and explanation).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

/// Raw question as emitted by a content-generation service.
/// Field names follow the JSON the model is asked to produce.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(length(min = 1, max = 2000))]
    pub explanation: String,
}

impl GeneratedQuestion {
    /// Trims every text field, validates the result and attaches `id`.
    ///
    /// Fails with a human-readable reason when the item is not a well-formed
    /// question; a failure never yields a partially-populated `Question`.
    pub fn into_question(self, id: impl Into<String>) -> Result<Question, String> {
        let cleaned = Self {
            question: self.question.trim().to_string(),
            options: self.options.iter().map(|o| o.trim().to_string()).collect(),
            correct_answer: self.correct_answer.trim().to_string(),
            explanation: self.explanation.trim().to_string(),
        };

        cleaned.validate().map_err(|e| e.to_string())?;

        if !cleaned.options.contains(&cleaned.correct_answer) {
            return Err(format!(
                "correct answer '{}' is not one of the options",
                cleaned.correct_answer
            ));
        }

        Ok(Question {
            id: id.into(),
            question: cleaned.question,
            options: cleaned.options,
            correct_answer: cleaned.correct_answer,
            explanation: cleaned.explanation,
        })
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != OPTIONS_PER_QUESTION {
        return Err(validator::ValidationError::new("wrong_option_count"));
    }
    let mut seen = HashSet::new();
    for opt in options {
        if opt.is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
        if !seen.insert(opt.as_str()) {
            return Err(validator::ValidationError::new("duplicate_option"));
        }
    }
    Ok(())
}
