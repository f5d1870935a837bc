// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::{
        quiz_config::QuizConfig,
        view::{AnswerResponse, SessionView},
    },
    session::QuizSession,
};

/// Topic shortcuts offered by the setup form.
pub const SUGGESTED_TOPICS: [&str; 4] = [
    "Hardware & Architecture",
    "Computer Networks",
    "Information Security",
    "Programming Languages",
];

/// DTO for submitting an answer.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// The option text the player picked.
    pub selected: String,
}

fn view_of(session: &QuizSession) -> SessionView {
    SessionView::new(&session.current_state(), session.current_config().as_ref())
}

/// Returns the current session as seen by a client.
pub async fn get_state(State(session): State<QuizSession>) -> impl IntoResponse {
    Json(view_of(&session))
}

/// Starts a quiz.
///
/// * Validates the config (400 on empty topic, unknown difficulty,
///   out-of-range count or a body that is not a config at all).
/// * Waits for question generation; 502 if the content source fails.
/// * 409 if a quiz is already loading or running.
pub async fn start_quiz(
    State(session): State<QuizSession>,
    payload: Result<Json<QuizConfig>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(config) = payload?;
    let state = session.start(config).await?;
    let config = session.current_config();

    Ok(Json(SessionView::new(&state, config.as_ref())))
}

/// Records an answer for the current question.
///
/// Returns the grading of that answer (with the correct option and the
/// explanation) together with the next view. After the last question the
/// response carries the final result.
pub async fn submit_answer(
    State(session): State<QuizSession>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = session.submit_answer(req.selected).await?;
    let config = session.current_config();

    Ok(Json(AnswerResponse {
        reveal: outcome.reveal,
        session: SessionView::new(&outcome.state, config.as_ref()),
    }))
}

/// Abandons whatever is running and returns to setup.
pub async fn restart_quiz(State(session): State<QuizSession>) -> impl IntoResponse {
    let state = session.restart();
    Json(SessionView::new(&state, None))
}

/// Lists suggested topics for the setup form.
pub async fn list_categories() -> impl IntoResponse {
    Json(SUGGESTED_TOPICS)
}
