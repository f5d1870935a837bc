// src/session.rs

//! Quiz session controller.
//!
//! Owns the [`SessionState`] and the transitions between its variants:
//!
//! ```text
//! Setup --start--> Loading(generating) --ok--> Playing
//!                                      --err--> Setup
//! Playing --answer, not last--> Playing
//! Playing --answer, last--> Loading(scoring) --> Results
//! any --restart--> Setup
//! ```
//!
//! Gateway calls are awaited with the state lock released. Every `start`
//! and `restart` bumps an epoch; a gateway result is applied only if the
//! epoch it was issued under is still current, so a restart never gets
//! overwritten by a late answer from a call it raced with.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use validator::Validate;

use crate::{
    error::AppError,
    gateways::{FeedbackProvider, QuestionGenerator},
    models::{
        quiz_config::QuizConfig,
        quiz_result::{AnsweredQuestion, QuizResult, count_correct},
        session_state::{LoadingContext, SessionState},
        view::AnswerReveal,
    },
};

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    config: Option<QuizConfig>,
    epoch: u64,
}

/// Result of a recorded answer: the grading of that answer plus the
/// state the session moved to.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub reveal: AnswerReveal,
    pub state: SessionState,
}

/// Handle to the single quiz session. Clones share the same session.
#[derive(Clone)]
pub struct QuizSession {
    inner: Arc<Mutex<SessionInner>>,
    generator: Arc<dyn QuestionGenerator>,
    feedback: Arc<dyn FeedbackProvider>,
}

impl QuizSession {
    pub fn new(generator: Arc<dyn QuestionGenerator>, feedback: Arc<dyn FeedbackProvider>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner::default())),
            generator,
            feedback,
        }
    }

    // A panic while holding the lock cannot leave a torn state: every
    // critical section assigns whole variants.
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only snapshot of the current state.
    pub fn current_state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Configuration of the running session, if one was started.
    pub fn current_config(&self) -> Option<QuizConfig> {
        self.lock().config.clone()
    }

    /// Starts a new session and waits for the questions.
    ///
    /// * Rejects an invalid config with `InvalidConfig`, leaving state untouched.
    /// * Only allowed from Setup; anything else is `InvalidTransition`.
    /// * Generator failure returns to Setup with `GenerationFailed`.
    pub async fn start(&self, config: QuizConfig) -> Result<SessionState, AppError> {
        config
            .validate()
            .map_err(|e| AppError::InvalidConfig(e.to_string()))?;

        let epoch = {
            let mut inner = self.lock();
            if !matches!(inner.state, SessionState::Setup) {
                return Err(AppError::InvalidTransition(format!(
                    "cannot start a quiz while {}",
                    inner.state.name()
                )));
            }
            inner.epoch += 1;
            inner.config = Some(config.clone());
            inner.state = SessionState::Loading {
                context: LoadingContext::Generating,
            };
            inner.epoch
        };

        tracing::info!(
            "Generating {} {} questions about '{}'",
            config.count,
            config.difficulty.label(),
            config.topic
        );

        let outcome = self.generator.generate(&config).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            tracing::info!("Discarding generated questions: session was restarted");
            return Err(AppError::Superseded);
        }

        match outcome {
            Ok(questions) if !questions.is_empty() => {
                tracing::info!("Quiz ready with {} questions", questions.len());
                inner.state = SessionState::Playing {
                    questions,
                    current_index: 0,
                    answers: Vec::new(),
                };
                Ok(inner.state.clone())
            }
            Ok(_) => {
                inner.state = SessionState::Setup;
                inner.config = None;
                Err(AppError::GenerationFailed(
                    "generator returned no questions".to_string(),
                ))
            }
            Err(e) => {
                tracing::warn!("Question generation failed, back to setup: {}", e);
                inner.state = SessionState::Setup;
                inner.config = None;
                Err(AppError::GenerationFailed(e.to_string()))
            }
        }
    }

    /// Records an answer for the current question.
    ///
    /// After the last question the session scores the answers and asks the
    /// feedback provider for a comment. A failing provider only drops the
    /// comment; the result is produced either way.
    pub async fn submit_answer(&self, selected: String) -> Result<AnswerOutcome, AppError> {
        let (reveal, answers, total, topic, epoch) = {
            let mut inner = self.lock();
            let current = inner.state.name();
            let topic = inner
                .config
                .as_ref()
                .map(|c| c.topic.clone())
                .unwrap_or_default();

            let SessionState::Playing {
                questions,
                current_index,
                answers,
            } = &mut inner.state
            else {
                return Err(AppError::InvalidTransition(format!(
                    "cannot submit an answer while {}",
                    current
                )));
            };

            let question = questions.get(*current_index).ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "question index {} out of range",
                    current_index
                ))
            })?;
            let answer = AnsweredQuestion::grade(question, selected);
            let reveal = AnswerReveal::new(question, &answer);
            answers.push(answer);

            if *current_index + 1 < questions.len() {
                *current_index += 1;
                return Ok(AnswerOutcome {
                    reveal,
                    state: inner.state.clone(),
                });
            }

            let total = questions.len();
            let answers = std::mem::take(answers);
            inner.state = SessionState::Loading {
                context: LoadingContext::Scoring,
            };
            (reveal, answers, total, topic, inner.epoch)
        };

        let score = count_correct(&answers);
        tracing::info!("Quiz finished: {}/{} on '{}'", score, total, topic);

        let ai_comment = match self.feedback.comment(score, total, &topic).await {
            Ok(comment) => Some(comment),
            Err(e) => {
                let err = AppError::FeedbackFailed(e.to_string());
                tracing::warn!("Continuing without a comment: {}", err);
                None
            }
        };

        let mut inner = self.lock();
        if inner.epoch != epoch {
            tracing::info!("Discarding quiz result: session was restarted");
            return Err(AppError::Superseded);
        }

        inner.state = SessionState::Results {
            result: QuizResult::new(answers, total, ai_comment),
        };
        Ok(AnswerOutcome {
            reveal,
            state: inner.state.clone(),
        })
    }

    /// Drops everything and returns to Setup. Valid from any state.
    pub fn restart(&self) -> SessionState {
        let mut inner = self.lock();
        if !matches!(inner.state, SessionState::Setup) {
            tracing::info!("Restarting session from {}", inner.state.name());
        }
        inner.epoch += 1;
        inner.config = None;
        inner.state = SessionState::Setup;
        inner.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::GatewayError;
    use crate::models::{question::Question, quiz_config::Difficulty};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn questions(n: usize) -> Vec<Question> {
        (1..=n)
            .map(|i| {
                Question::new(
                    format!("q{}", i),
                    format!("Question {}", i),
                    vec!["right".into(), "wrong".into(), "other".into(), "none".into()],
                    "right",
                    "Because it is.",
                )
            })
            .collect()
    }

    fn networking() -> QuizConfig {
        QuizConfig::new("Networking", Difficulty::Basic, 3)
    }

    struct ScriptedGenerator {
        questions: Option<Vec<Question>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn ok(questions: Vec<Question>) -> Arc<Self> {
            Arc::new(Self {
                questions: Some(questions),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                questions: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QuestionGenerator for ScriptedGenerator {
        async fn generate(&self, _config: &QuizConfig) -> Result<Vec<Question>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.questions
                .clone()
                .ok_or_else(|| GatewayError::Malformed("unreachable".to_string()))
        }
    }

    struct ScriptedFeedback {
        reply: Option<String>,
        last_call: Mutex<Option<(usize, usize, String)>>,
    }

    impl ScriptedFeedback {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                last_call: Mutex::new(None),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                last_call: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl FeedbackProvider for ScriptedFeedback {
        async fn comment(
            &self,
            score: usize,
            total: usize,
            topic: &str,
        ) -> Result<String, GatewayError> {
            *self.last_call.lock().unwrap() = Some((score, total, topic.to_string()));
            self.reply.clone().ok_or(GatewayError::Empty)
        }
    }

    /// Generator that blocks until released, to race a restart against it.
    struct GatedGenerator {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl QuestionGenerator for GatedGenerator {
        async fn generate(&self, _config: &QuizConfig) -> Result<Vec<Question>, GatewayError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(questions(3))
        }
    }

    struct GatedFeedback {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl FeedbackProvider for GatedFeedback {
        async fn comment(&self, _: usize, _: usize, _: &str) -> Result<String, GatewayError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("late".to_string())
        }
    }

    fn session(questions: Vec<Question>, feedback: Arc<ScriptedFeedback>) -> QuizSession {
        QuizSession::new(ScriptedGenerator::ok(questions), feedback)
    }

    fn assert_playing(state: &SessionState, index: usize, answered: usize) {
        match state {
            SessionState::Playing {
                current_index,
                answers,
                ..
            } => {
                assert_eq!(*current_index, index);
                assert_eq!(answers.len(), answered);
            }
            other => panic!("expected playing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_setup() {
        let s = session(questions(3), ScriptedFeedback::ok("hi"));
        assert_eq!(s.current_state(), SessionState::Setup);
        assert!(s.current_config().is_none());
    }

    #[tokio::test]
    async fn test_start_enters_playing() {
        let s = session(questions(3), ScriptedFeedback::ok("hi"));

        let state = s.start(networking()).await.unwrap();

        assert_playing(&state, 0, 0);
        assert_eq!(s.current_state(), state);
        assert_eq!(s.current_config(), Some(networking()));
    }

    #[tokio::test]
    async fn test_wrong_answer_advances() {
        let s = session(questions(3), ScriptedFeedback::ok("hi"));
        s.start(networking()).await.unwrap();

        let outcome = s.submit_answer("wrong".into()).await.unwrap();

        assert!(!outcome.reveal.is_correct);
        assert_eq!(outcome.reveal.correct_answer, "right");
        assert_eq!(outcome.reveal.question_id, "q1");
        assert_playing(&outcome.state, 1, 1);
        match s.current_state() {
            SessionState::Playing { answers, .. } => {
                assert_eq!(answers[0].selected, "wrong");
                assert!(!answers[0].is_correct);
            }
            other => panic!("expected playing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_answer_outside_options_is_incorrect() {
        let s = session(questions(3), ScriptedFeedback::ok("hi"));
        s.start(networking()).await.unwrap();

        let outcome = s.submit_answer("no such option".into()).await.unwrap();
        assert!(!outcome.reveal.is_correct);
    }

    #[tokio::test]
    async fn test_last_answer_produces_result_with_comment() {
        let feedback = ScriptedFeedback::ok("Well done");
        let s = session(questions(3), feedback.clone());
        s.start(networking()).await.unwrap();

        s.submit_answer("wrong".into()).await.unwrap();
        s.submit_answer("right".into()).await.unwrap();
        let outcome = s.submit_answer("right".into()).await.unwrap();

        assert!(outcome.reveal.is_correct);
        let SessionState::Results { result } = outcome.state else {
            panic!("expected results");
        };
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.answers.len(), 3);
        assert_eq!(result.ai_comment.as_deref(), Some("Well done"));
        assert_eq!(
            result.answers.iter().map(|a| a.question_id.as_str()).collect::<Vec<_>>(),
            vec!["q1", "q2", "q3"]
        );
        assert_eq!(
            *feedback.last_call.lock().unwrap(),
            Some((2, 3, "Networking".to_string()))
        );
    }

    #[tokio::test]
    async fn test_feedback_failure_still_produces_result() {
        let s = session(questions(3), ScriptedFeedback::failing());
        s.start(networking()).await.unwrap();

        for _ in 0..3 {
            s.submit_answer("right".into()).await.unwrap();
        }

        let SessionState::Results { result } = s.current_state() else {
            panic!("expected results");
        };
        assert_eq!(result.score, 3);
        assert!(result.ai_comment.is_none());
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_without_state_change() {
        let generator = ScriptedGenerator::ok(questions(3));
        let s = QuizSession::new(generator.clone(), ScriptedFeedback::ok("hi"));

        let err = s
            .start(QuizConfig::new("", Difficulty::Basic, 3))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidConfig(_)));
        assert_eq!(s.current_state(), SessionState::Setup);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_count_rejected() {
        let s = session(questions(3), ScriptedFeedback::ok("hi"));
        let err = s
            .start(QuizConfig::new("Linux", Difficulty::Basic, 16))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_generation_failure_returns_to_setup() {
        let s = QuizSession::new(ScriptedGenerator::failing(), ScriptedFeedback::ok("hi"));

        let err = s.start(networking()).await.unwrap_err();

        assert!(matches!(err, AppError::GenerationFailed(_)));
        assert_eq!(s.current_state(), SessionState::Setup);
        assert!(s.current_config().is_none());
    }

    #[tokio::test]
    async fn test_empty_generation_is_a_failure() {
        let s = session(Vec::new(), ScriptedFeedback::ok("hi"));
        let err = s.start(networking()).await.unwrap_err();
        assert!(matches!(err, AppError::GenerationFailed(_)));
        assert_eq!(s.current_state(), SessionState::Setup);
    }

    #[tokio::test]
    async fn test_start_rejected_outside_setup() {
        let s = session(questions(1), ScriptedFeedback::ok("hi"));
        s.start(networking()).await.unwrap();

        let err = s.start(networking()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_playing(&s.current_state(), 0, 0);

        s.submit_answer("right".into()).await.unwrap();
        let err = s.start(networking()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert!(matches!(s.current_state(), SessionState::Results { .. }));
    }

    #[tokio::test]
    async fn test_answer_rejected_outside_playing() {
        let s = session(questions(1), ScriptedFeedback::ok("hi"));

        let err = s.submit_answer("right".into()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(s.current_state(), SessionState::Setup);

        s.start(networking()).await.unwrap();
        s.submit_answer("right".into()).await.unwrap();

        let err = s.submit_answer("right".into()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_answers_track_index_throughout() {
        let s = session(questions(5), ScriptedFeedback::ok("hi"));
        s.start(QuizConfig::new("Linux", Difficulty::Intermediate, 5))
            .await
            .unwrap();

        for i in 0..4 {
            assert_playing(&s.current_state(), i, i);
            let selected = if i % 2 == 0 { "right" } else { "nope" };
            s.submit_answer(selected.to_string()).await.unwrap();
        }
        s.submit_answer("right".into()).await.unwrap();

        let SessionState::Results { result } = s.current_state() else {
            panic!("expected results");
        };
        assert_eq!(result.answers.len(), result.total);
        assert_eq!(result.score, result.answers.iter().filter(|a| a.is_correct).count());
        assert_eq!(result.score, 3);
    }

    #[tokio::test]
    async fn test_current_state_is_idempotent() {
        let s = session(questions(3), ScriptedFeedback::ok("hi"));
        s.start(networking()).await.unwrap();
        s.submit_answer("right".into()).await.unwrap();

        assert_eq!(s.current_state(), s.current_state());
    }

    #[tokio::test]
    async fn test_restart_from_every_state() {
        let s = session(questions(1), ScriptedFeedback::ok("hi"));

        assert_eq!(s.restart(), SessionState::Setup);

        s.start(networking()).await.unwrap();
        assert_eq!(s.restart(), SessionState::Setup);
        assert!(s.current_config().is_none());

        s.start(networking()).await.unwrap();
        s.submit_answer("right".into()).await.unwrap();
        assert_eq!(s.restart(), SessionState::Setup);

        // a fresh session is unaffected by the previous one
        let state = s.start(networking()).await.unwrap();
        assert_playing(&state, 0, 0);
    }

    #[tokio::test]
    async fn test_restart_discards_in_flight_generation() {
        let gate = Arc::new(GatedGenerator {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let s = QuizSession::new(gate.clone(), ScriptedFeedback::ok("hi"));

        let pending = {
            let s = s.clone();
            tokio::spawn(async move { s.start(networking()).await })
        };
        gate.entered.notified().await;
        assert_eq!(
            s.current_state(),
            SessionState::Loading {
                context: LoadingContext::Generating
            }
        );

        // double submission while loading
        let err = s.start(networking()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        s.restart();
        gate.release.notify_one();

        let res = pending.await.unwrap();
        assert!(matches!(res, Err(AppError::Superseded)));
        assert_eq!(s.current_state(), SessionState::Setup);
    }

    #[tokio::test]
    async fn test_restart_discards_in_flight_feedback() {
        let gate = Arc::new(GatedFeedback {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let s = QuizSession::new(ScriptedGenerator::ok(questions(1)), gate.clone());
        s.start(networking()).await.unwrap();

        let pending = {
            let s = s.clone();
            tokio::spawn(async move { s.submit_answer("right".into()).await })
        };
        gate.entered.notified().await;
        assert_eq!(
            s.current_state(),
            SessionState::Loading {
                context: LoadingContext::Scoring
            }
        );

        s.restart();
        gate.release.notify_one();

        let res = pending.await.unwrap();
        assert!(matches!(res, Err(AppError::Superseded)));
        assert_eq!(s.current_state(), SessionState::Setup);
    }
}
