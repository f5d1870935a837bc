// src/gateways/gemini.rs

use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::{
    config::{Config, MAX_GENERATED_QUESTIONS, OPTIONS_PER_QUESTION},
    gateways::{FeedbackProvider, GatewayError, QuestionGenerator},
    models::{
        question::{GeneratedQuestion, Question},
        quiz_config::QuizConfig,
    },
};

/// Matches a reply wrapped in a Markdown code fence (```json ... ```).
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("code fence pattern is valid")
});

const ERROR_BODY_LIMIT: usize = 200;

/// Gemini `generateContent` client. Serves both as question generator and
/// as feedback provider.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
    model: String,
    api_key: String,
}

// Request body for generateContent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    temperature: f32,
}

// Response body, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// The model may answer with a bare array or wrap it in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionPayload {
    List(Vec<GeneratedQuestion>),
    Wrapped { questions: Vec<GeneratedQuestion> },
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gateway_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    /// Sends a single-turn prompt and returns the text of the first candidate.
    async fn generate_text(
        &self,
        prompt: &str,
        json_output: bool,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let url = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: json_output.then_some("application/json"),
                temperature,
            },
        };

        tracing::debug!("Calling {} (json_output={})", url, json_output);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_text().ok_or(GatewayError::Empty)
    }
}

#[async_trait]
impl QuestionGenerator for GeminiClient {
    async fn generate(&self, config: &QuizConfig) -> Result<Vec<Question>, GatewayError> {
        let text = self
            .generate_text(&question_prompt(config), true, 0.7)
            .await?;
        let questions = parse_questions(&text)?;

        if questions.len() != config.count as usize {
            tracing::warn!(
                "Asked for {} questions about '{}', got {}",
                config.count,
                config.topic,
                questions.len()
            );
        }

        Ok(questions)
    }
}

#[async_trait]
impl FeedbackProvider for GeminiClient {
    async fn comment(
        &self,
        score: usize,
        total: usize,
        topic: &str,
    ) -> Result<String, GatewayError> {
        let text = self
            .generate_text(&feedback_prompt(score, total, topic), false, 0.9)
            .await?;
        Ok(text.trim().to_string())
    }
}

/// Prompt asking for `config.count` questions as a JSON array.
pub fn question_prompt(config: &QuizConfig) -> String {
    format!(
        "You are writing a multiple-choice quiz about information technology.\n\
         Topic: {}\n\
         Difficulty: {}\n\
         Write exactly {} questions. Each question has exactly {} distinct options and exactly one correct answer.\n\
         Respond with JSON only: an array of objects with the fields \"question\", \"options\" \
         (array of {} strings), \"correctAnswer\" (copied verbatim from options) and \"explanation\" \
         (one or two sentences on why the answer is correct).",
        config.topic.trim(),
        config.difficulty.label(),
        config.count,
        OPTIONS_PER_QUESTION,
        OPTIONS_PER_QUESTION,
    )
}

/// Prompt asking for a short comment on the final score.
pub fn feedback_prompt(score: usize, total: usize, topic: &str) -> String {
    format!(
        "A player just finished a quiz about {} and answered {} out of {} questions correctly.\n\
         Write one or two short sentences commenting on the performance, in the voice of a terse \
         hacker terminal. Plain text only, no Markdown.",
        topic, score, total
    )
}

/// Parses the model's reply into validated questions with fresh ids.
///
/// * Strips a surrounding Markdown code fence if present.
/// * Accepts a bare array or an object with a `questions` array.
/// * Any invalid item fails the whole batch.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, GatewayError> {
    let json = match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    };

    let items = match serde_json::from_str::<QuestionPayload>(json)? {
        QuestionPayload::List(items) => items,
        QuestionPayload::Wrapped { questions } => questions,
    };

    if items.is_empty() {
        return Err(GatewayError::Empty);
    }
    if items.len() > MAX_GENERATED_QUESTIONS {
        return Err(GatewayError::Malformed(format!(
            "{} questions exceeds the limit of {}",
            items.len(),
            MAX_GENERATED_QUESTIONS
        )));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            item.into_question(Uuid::new_v4().to_string())
                .map_err(|reason| GatewayError::Malformed(format!("question {}: {}", i + 1, reason)))
        })
        .collect()
}
