//! In-memory transport and failure sink for testing
//!
//! Captures outbound messages and reported failures so tests can assert on
//! exactly what a user would have seen and what would have been reported.

use std::sync::{Arc, Mutex};

use crate::failure::{FailureContext, FailureSink};
use crate::transport::{ConversationId, MessageSender};

/// Message captured by the mock sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub conversation_id: ConversationId,
    pub text: String,
}

/// Mock outbound transport
#[derive(Debug, Clone, Default)]
pub struct MockMessageSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl MockMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages in send order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Captured texts for a single conversation
    pub fn texts_for(&self, conversation_id: ConversationId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Most recent message sent to a conversation
    pub fn last_text_for(&self, conversation_id: ConversationId) -> Option<String> {
        self.texts_for(conversation_id).pop()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl MessageSender for MockMessageSender {
    async fn send(&self, conversation_id: ConversationId, text: &str) {
        self.sent.lock().unwrap().push(SentMessage {
            conversation_id,
            text: text.to_string(),
        });
    }
}

/// Failure captured by the mock sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFailure {
    pub message: String,
    pub context: FailureContext,
}

/// Mock failure sink
#[derive(Debug, Clone, Default)]
pub struct MockFailureSink {
    reports: Arc<Mutex<Vec<ReportedFailure>>>,
}

impl MockFailureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ReportedFailure> {
        self.reports.lock().unwrap().clone()
    }

    /// Operations that reported a failure, in report order
    pub fn operations(&self) -> Vec<&'static str> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.context.operation)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().unwrap().is_empty()
    }
}

impl FailureSink for MockFailureSink {
    fn report(&self, error: &(dyn std::error::Error + Send + Sync), context: FailureContext) {
        self.reports.lock().unwrap().push(ReportedFailure {
            message: error.to_string(),
            context,
        });
    }
}
