//! Telegram webhook state

use std::sync::Arc;

use planpal_common::{FailureSink, InboundHandler};

/// How the webhook hands a message to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Acknowledge immediately and process on a spawned task
    #[default]
    Spawn,
    /// Process before acknowledging (runtimes that freeze after the response, e.g. Lambda)
    Inline,
}

/// Application state for the Telegram webhook
#[derive(Clone)]
pub struct TelegramState {
    pub handler: Arc<dyn InboundHandler>,
    pub failures: Arc<dyn FailureSink>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`; `None` disables the check
    pub secret_token: Option<String>,
    pub dispatch: DispatchMode,
}
