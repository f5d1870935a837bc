// src/models/quiz_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// One recorded answer. Created exactly once per question, in answer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_id: String,
    pub selected: String,
    pub is_correct: bool,
}

impl AnsweredQuestion {
    /// Grades `selected` against the question's answer key.
    pub fn grade(question: &Question, selected: String) -> Self {
        Self {
            question_id: question.id.clone(),
            is_correct: question.is_correct(&selected),
            selected,
        }
    }
}

/// Final tally of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub answers: Vec<AnsweredQuestion>,

    /// Absent when the commentary service failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_comment: Option<String>,

    pub completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Builds the result; `score` is always derived from `answers`.
    pub fn new(answers: Vec<AnsweredQuestion>, total: usize, ai_comment: Option<String>) -> Self {
        Self {
            score: count_correct(&answers),
            total,
            answers,
            ai_comment,
            completed_at: Utc::now(),
        }
    }
}

pub fn count_correct(answers: &[AnsweredQuestion]) -> usize {
    answers.iter().filter(|a| a.is_correct).count()
}
