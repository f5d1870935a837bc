// src/models/view.rs

use serde::Serialize;

use crate::models::{
    question::{PublicQuestion, Question},
    quiz_config::QuizConfig,
    quiz_result::{AnsweredQuestion, QuizResult},
    session_state::{LoadingContext, SessionState},
};

/// What a client is allowed to see of the session.
/// The Playing view carries only the current question, never its answer key.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionView {
    Setup,
    Loading {
        context: LoadingContext,
        topic: Option<String>,
    },
    Playing {
        topic: Option<String>,
        question: PublicQuestion,
        current_index: usize,
        total: usize,
        answers: Vec<AnsweredQuestion>,
    },
    Results {
        topic: Option<String>,
        result: QuizResult,
    },
}

impl SessionView {
    pub fn new(state: &SessionState, config: Option<&QuizConfig>) -> Self {
        let topic = config.map(|c| c.topic.clone());
        match state {
            SessionState::Setup => SessionView::Setup,
            SessionState::Loading { context } => SessionView::Loading {
                context: *context,
                topic,
            },
            SessionState::Playing {
                questions,
                current_index,
                answers,
            } => match questions.get(*current_index) {
                Some(question) => SessionView::Playing {
                    topic,
                    question: PublicQuestion::from(question),
                    current_index: *current_index,
                    total: questions.len(),
                    answers: answers.clone(),
                },
                None => {
                    tracing::error!(
                        "Session is playing with index {} of {} questions",
                        current_index,
                        questions.len()
                    );
                    SessionView::Setup
                }
            },
            SessionState::Results { result } => SessionView::Results {
                topic,
                result: result.clone(),
            },
        }
    }
}

/// Revealed after each answer: the grading plus the explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerReveal {
    pub question_id: String,
    pub selected: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

impl AnswerReveal {
    pub fn new(question: &Question, answer: &AnsweredQuestion) -> Self {
        Self {
            question_id: answer.question_id.clone(),
            selected: answer.selected.clone(),
            is_correct: answer.is_correct,
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
        }
    }
}

/// DTO returned by the answer endpoint.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub reveal: AnswerReveal,
    pub session: SessionView,
}
