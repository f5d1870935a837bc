// src/config.rs

use std::{env, fmt, net::SocketAddr};

use dotenvy::dotenv;
use url::Url;

/// Smallest number of questions a quiz may ask for.
pub const MIN_QUESTION_COUNT: u32 = 3;

/// Largest number of questions a quiz may ask for.
pub const MAX_QUESTION_COUNT: u32 = 15;

/// Question count used when the caller does not pick one.
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

/// Every generated question carries exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Upper bound on how many questions a single generation may return.
pub const MAX_GENERATED_QUESTIONS: usize = 30;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: Url,
    pub gateway_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
}

/// Raised when the environment does not describe a usable configuration.
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        let gemini_base_url = parse_base_url(
            &env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
        )?;

        let gateway_timeout_secs = match env::var("GATEWAY_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout_secs(&raw)?,
            Err(_) => DEFAULT_GATEWAY_TIMEOUT_SECS,
        };

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        Ok(Self {
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            gateway_timeout_secs,
            bind_addr,
            rust_log,
            log_dir,
        })
    }
}

/// Parses the gateway timeout; zero would fail every call immediately.
pub fn parse_timeout_secs(raw: &str) -> Result<u64, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        key: "GATEWAY_TIMEOUT_SECS",
        reason: e.to_string(),
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: "GATEWAY_TIMEOUT_SECS",
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(secs)
}

/// Parses the gateway base URL, forcing a trailing slash so that
/// `Url::join` appends API paths instead of replacing the last segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };

    Url::parse(&with_slash).map_err(|e| ConfigError::Invalid {
        key: "GEMINI_BASE_URL",
        reason: e.to_string(),
    })
}
