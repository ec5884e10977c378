//! Failure sink
//!
//! Every error captured while serving a message is handed to a `FailureSink`
//! together with the conversation and operation it came from. Reporting is
//! synchronous and must never block or fail the caller.

use std::fmt;

use crate::transport::ConversationId;

/// Where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureContext {
    pub conversation_id: Option<ConversationId>,
    pub operation: &'static str,
}

impl FailureContext {
    /// Failure tied to a specific conversation
    pub fn conversation(conversation_id: ConversationId, operation: &'static str) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            operation,
        }
    }

    /// Failure outside any conversation (startup, polling, webhook parsing)
    pub fn process(operation: &'static str) -> Self {
        Self {
            conversation_id: None,
            operation,
        }
    }
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.conversation_id {
            Some(id) => write!(f, "{} (conversation {})", self.operation, id),
            None => write!(f, "{}", self.operation),
        }
    }
}

/// Receives captured error events for observability
pub trait FailureSink: Send + Sync {
    fn report(&self, error: &(dyn std::error::Error + Send + Sync), context: FailureContext);
}

/// Failure sink that emits a structured `tracing` error event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn report(&self, error: &(dyn std::error::Error + Send + Sync), context: FailureContext) {
        tracing::error!(
            conversation_id = ?context.conversation_id,
            operation = context.operation,
            error = %error,
            source = ?error.source().map(|s| s.to_string()),
            "Captured failure"
        );
    }
}
