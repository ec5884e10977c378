//! Single-shot text generation
//!
//! `TextGenerator` turns one prompt into one reply: a fixed persona, a capped
//! reply length, a fixed temperature, and a bounded wait. It holds no
//! conversation state, so every call is independent.

use std::sync::Arc;
use std::time::Duration;

use crate::{CompletionRequest, LlmError, LlmMessage, LlmService};

const DEFAULT_PERSONA: &str = "You are a helpful assistant.";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 100;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request shaping applied to every generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// System instruction that sets the assistant's tone
    pub system_persona: String,
    /// Caps reply length
    pub max_output_tokens: u32,
    /// Sampling randomness
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            system_persona: DEFAULT_PERSONA.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Prompt-in, text-out client over an `LlmService`
#[derive(Clone)]
pub struct TextGenerator {
    service: Arc<dyn LlmService>,
    options: GenerationOptions,
    timeout: Duration,
}

impl TextGenerator {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self {
            service,
            options: GenerationOptions::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate a reply to `prompt`, trimmed of surrounding whitespace.
    ///
    /// No retry is performed; a timeout surfaces as `LlmError::Timeout` and
    /// a blank reply as `LlmError::Response`.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: String::new(),
            system_prompt: Some(self.options.system_persona.clone()),
            messages: vec![LlmMessage::user(prompt)],
            max_tokens: Some(self.options.max_output_tokens),
            temperature: Some(self.options.temperature),
        };

        let response = tokio::time::timeout(self.timeout, self.service.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        tracing::debug!(
            model = %response.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Generation completed"
        );

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::Response("Generation returned empty text".to_string()));
        }

        Ok(text.to_string())
    }
}
