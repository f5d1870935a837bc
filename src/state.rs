// src/state.rs

use crate::session::QuizSession;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub session: QuizSession,
}

impl FromRef<AppState> for QuizSession {
    fn from_ref(state: &AppState) -> Self {
        state.session.clone()
    }
}
