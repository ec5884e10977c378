//! Planpal Telegram Transport
//!
//! Connects the conversation orchestrator to Telegram:
//! - `TelegramClient`: Bot API calls (sendMessage, getUpdates, webhook management)
//! - `Poller`: long-polling loop that dispatches one task per inbound message
//! - `api::routes`: webhook endpoint for push delivery

pub mod api;
pub mod client;
pub mod poller;
pub mod types;

use std::time::Duration;

use thiserror::Error;

pub use api::{routes, DispatchMode, TelegramState};
pub use client::TelegramClient;
pub use poller::Poller;
pub use types::Update;

const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram configuration error: {0}")]
    Configuration(String),

    #[error("Telegram request error: {0}")]
    Request(String),

    #[error("Telegram API error ({code}): {description}")]
    Api { code: i32, description: String },

    #[error("Telegram response error: {0}")]
    Response(String),
}

/// How updates reach the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramMode {
    Polling,
    Webhook,
}

impl std::str::FromStr for TelegramMode {
    type Err = TelegramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "webhook" => Ok(Self::Webhook),
            other => Err(TelegramError::Configuration(format!(
                "Unknown Telegram mode: {}. Supported modes: polling, webhook",
                other
            ))),
        }
    }
}

/// Telegram transport configuration
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub mode: TelegramMode,
    pub api_base_url: String,
    /// Public URL Telegram should push updates to (webhook mode)
    pub webhook_url: Option<String>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value
    pub webhook_secret: Option<String>,
    pub poll_timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[redacted]")
            .field("mode", &self.mode)
            .field("api_base_url", &self.api_base_url)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[redacted]"))
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl TelegramConfig {
    /// Create Telegram config from environment variables
    pub fn from_env() -> Result<Self, TelegramError> {
        dotenvy::dotenv().ok();

        let token = std::env::var("TELEGRAM_TOKEN")
            .map_err(|_| TelegramError::Configuration("TELEGRAM_TOKEN is required".to_string()))?;

        let mode = match std::env::var("TELEGRAM_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => TelegramMode::Polling,
        };

        let api_base_url = std::env::var("TELEGRAM_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let webhook_url = std::env::var("TELEGRAM_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.is_empty());
        let webhook_secret = std::env::var("TELEGRAM_WEBHOOK_SECRET")
            .ok()
            .filter(|v| !v.is_empty());

        let poll_timeout_secs = std::env::var("TELEGRAM_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);

        Ok(Self {
            token,
            mode,
            api_base_url,
            webhook_url,
            webhook_secret,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
        })
    }
}
