//! Telegram Bot API client
//!
//! Calls `https://api.telegram.org/bot<token>/<method>` with JSON bodies and
//! unwraps the `{ok, result, description}` envelope.

use std::time::Duration;

use planpal_common::{ConversationId, MessageSender};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::types::{ApiResponse, GetUpdatesBody, SendMessageBody, SetWebhookBody, Update};
use crate::{TelegramConfig, TelegramError};

const ALLOWED_UPDATES: &[&str] = &["message"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Extra wait on top of the long-poll timeout before the HTTP call gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let client = Client::builder().build().map_err(|e| {
            TelegramError::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            // The URL carries the bot token; keep it out of errors and logs
            .map_err(|e| TelegramError::Request(format!("{} failed: {}", method, e.without_url())))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            TelegramError::Response(format!(
                "{} returned {} with unreadable body: {}",
                method,
                status,
                e.without_url()
            ))
        })?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or(i32::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::Response(format!("{} returned no result", method)))
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdatesBody {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &body, poll_timeout + POLL_GRACE)
            .await
    }

    pub async fn send_message(
        &self,
        chat_id: ConversationId,
        text: &str,
    ) -> Result<(), TelegramError> {
        let body = SendMessageBody { chat_id, text };
        let _sent: serde_json::Value = self.call("sendMessage", &body, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    /// Register `url` for push delivery
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), TelegramError> {
        let body = SetWebhookBody {
            url,
            secret_token,
            allowed_updates: ALLOWED_UPDATES,
        };
        let _: bool = self.call("setWebhook", &body, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    /// Remove any registered webhook; required before `getUpdates` works
    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _: bool = self
            .call("deleteWebhook", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, conversation_id: ConversationId, text: &str) {
        if let Err(e) = self.send_message(conversation_id, text).await {
            tracing::warn!(
                conversation_id,
                error = %e,
                "Failed to deliver outbound message"
            );
        }
    }
}
