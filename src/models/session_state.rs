// src/models/session_state.rs

use serde::{Deserialize, Serialize};

use crate::models::{
    question::Question,
    quiz_result::{AnsweredQuestion, QuizResult},
};

/// What a `Loading` session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingContext {
    Generating,
    Scoring,
}

/// The quiz state machine. Exactly one variant is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Setup,
    Loading {
        context: LoadingContext,
    },
    Playing {
        questions: Vec<Question>,
        current_index: usize,
        answers: Vec<AnsweredQuestion>,
    },
    Results {
        result: QuizResult,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Setup => "setup",
            SessionState::Loading { .. } => "loading",
            SessionState::Playing { .. } => "playing",
            SessionState::Results { .. } => "results",
        }
    }
}
