//! Error taxonomy for message orchestration
//!
//! None of these ever reach the end user; the orchestrator reports them to
//! the failure sink and answers with a fixed text.

use planpal_common::RepositoryError;
use planpal_llm::LlmError;
use thiserror::Error;

use crate::domain::state::StateError;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// State store unreachable or the operation failed
    #[error("State store unavailable: {0}")]
    StoreUnavailable(#[from] RepositoryError),

    /// Upstream generation failed or timed out
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    /// Any other failure while handling a message
    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}

impl From<StateError> for OrchestrationError {
    fn from(err: StateError) -> Self {
        OrchestrationError::Dispatch(err.to_string())
    }
}
