//! Mock LLM Service Implementation
//!
//! Programmable mock used by `LlmServiceFactory` when provider is `"mock"`
//! and by tests:
//! - `MockLlmService`: records every request it receives
//! - `MockLlmBehavior`: controls outcome and delay
//! - `MockOutcome`: Echo, Reply, Fail, or Hang

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

/// What the mock should answer with
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockOutcome {
    /// Echo the last message back ("Mock response to: ...")
    #[default]
    Echo,
    /// Answer with a fixed text
    Reply(String),
    /// Fail with a response error
    Fail,
    /// Never answer (simulates an upstream that hangs until timeout)
    Hang,
}

/// Programmable behavior for the mock LLM service
#[derive(Debug, Clone, Default)]
pub struct MockLlmBehavior {
    pub outcome: Arc<RwLock<MockOutcome>>,
    pub delay_ms: Arc<RwLock<u64>>,
}

impl MockLlmBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.write().unwrap() = outcome;
    }

    /// Delay applied before answering
    pub fn set_delay_ms(&self, delay: u64) {
        *self.delay_ms.write().unwrap() = delay;
    }

    pub fn reset(&self) {
        *self.outcome.write().unwrap() = MockOutcome::Echo;
        *self.delay_ms.write().unwrap() = 0;
    }

    pub fn get_outcome(&self) -> MockOutcome {
        self.outcome.read().unwrap().clone()
    }

    pub fn get_delay_ms(&self) -> u64 {
        *self.delay_ms.read().unwrap()
    }
}

/// Mock LLM service for testing
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    behavior: Arc<MockLlmBehavior>,
    history: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a new mock LLM service
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that always answers with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        let service = Self::new();
        service.behavior.set_outcome(MockOutcome::Reply(text.into()));
        service
    }

    /// Shared behavior handle for reconfiguring the mock mid-test
    pub fn behavior(&self) -> &Arc<MockLlmBehavior> {
        &self.behavior
    }

    /// Requests received so far, in call order
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.history.lock().unwrap().clone()
    }

    /// Last user prompt of every recorded request
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.recorded_requests()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing completion request");

        self.history.lock().unwrap().push(request.clone());

        let delay = self.behavior.get_delay_ms();
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model
        };

        let content = match self.behavior.get_outcome() {
            MockOutcome::Echo => {
                let last_message = request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or("empty");
                format!("Mock response to: {}", last_message)
            }
            MockOutcome::Reply(text) => text,
            MockOutcome::Fail => {
                return Err(LlmError::Response("Mock LLM failure".to_string()));
            }
            MockOutcome::Hang => std::future::pending::<String>().await,
        };

        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
