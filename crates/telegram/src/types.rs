//! Telegram Bot API wire types
//!
//! Only the fields the service reads are modelled; everything else in the
//! payload is ignored by serde.

use planpal_common::{ConversationId, InboundMessage};
use serde::{Deserialize, Serialize};

/// Bot API response envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ConversationId,
}

impl Update {
    /// The inbound text message carried by this update, if any.
    ///
    /// Non-message updates and messages without text (stickers, photos)
    /// yield `None`.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        let text = message.text?;
        Some(InboundMessage::new(message.chat.id, text))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageBody<'a> {
    pub chat_id: ConversationId,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesBody {
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub(crate) struct SetWebhookBody<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
    pub allowed_updates: &'static [&'static str],
}
