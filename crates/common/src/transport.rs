//! Message transport contracts
//!
//! The transport delivers `InboundMessage`s to an `InboundHandler` and accepts
//! outbound text through a `MessageSender`. Neither side knows which concrete
//! transport (Telegram polling, Telegram webhook, tests) is in use.

use serde::{Deserialize, Serialize};

/// Conversation identity as assigned by the transport (Telegram chat id)
pub type ConversationId = i64;

/// One inbound message from the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub conversation_id: ConversationId,
    pub text: String,
}

impl InboundMessage {
    pub fn new(conversation_id: ConversationId, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            text: text.into(),
        }
    }
}

/// Outbound side of the transport.
///
/// Fire-and-forget: implementations log delivery failures themselves and
/// never surface them to the caller.
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, conversation_id: ConversationId, text: &str);
}

/// Consumer of inbound messages
#[async_trait::async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, message: InboundMessage);
}
