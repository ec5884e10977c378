//! Planpal LLM Service
//!
//! Provides text generation for the conversation orchestrator:
//! - `LlmService` trait with an OpenAI chat-completions provider
//! - Programmable mock provider for testing and development
//! - `TextGenerator`, the single-shot prompt-in/text-out client with a bounded timeout

pub mod generator;
pub mod mock;
pub mod openai;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use generator::{GenerationOptions, TextGenerator};

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
}

/// Role of a message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Empty string selects the provider default
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// LLM service configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Provider name (openai, mock)
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    /// Override for the provider's API root (proxies, tests)
    pub base_url: Option<String>,
    /// Upper bound on a single generation call
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[redacted]")
            .field("default_model", &self.default_model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) => key,
            Err(_) if provider == "mock" => String::new(),
            Err(_) => {
                return Err(LlmError::Configuration(
                    "OPENAI_API_KEY is required".to_string(),
                ))
            }
        };

        let default_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url = std::env::var("LLM_BASE_URL").ok().filter(|v| !v.is_empty());

        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            provider,
            api_key,
            default_model,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// LLM provider trait
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Run a single completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when the request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// LLM service factory
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    /// Create LLM service based on configuration
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!(model = %config.default_model, "Creating OpenAI LLM service");
                Ok(Box::new(openai::OpenAiService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: openai, mock",
                provider
            ))),
        }
    }
}
