//! Long-polling update loop
//!
//! Each text message is handed to the inbound handler on its own task, so a
//! slow generation call for one chat never holds up the others.

use std::sync::Arc;
use std::time::Duration;

use planpal_common::{FailureContext, FailureSink, InboundHandler, InboundMessage};
use tokio::task::JoinHandle;

use crate::client::TelegramClient;
use crate::TelegramError;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Result of one `getUpdates` round
pub struct PollOutcome {
    /// Offset to acknowledge on the next call
    pub next_offset: Option<i64>,
    /// Handler tasks spawned for this batch
    pub tasks: Vec<JoinHandle<()>>,
}

pub struct Poller {
    client: TelegramClient,
    handler: Arc<dyn InboundHandler>,
    failures: Arc<dyn FailureSink>,
    poll_timeout: Duration,
    retry_delay: Duration,
}

impl Poller {
    pub fn new(
        client: TelegramClient,
        handler: Arc<dyn InboundHandler>,
        failures: Arc<dyn FailureSink>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            client,
            handler,
            failures,
            poll_timeout,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Fetch one batch of updates and dispatch its text messages
    pub async fn poll_once(&self, offset: Option<i64>) -> Result<PollOutcome, TelegramError> {
        let updates = self.client.get_updates(offset, self.poll_timeout).await?;

        let mut next_offset = offset;
        let mut tasks = Vec::new();

        for update in updates {
            let acknowledged = update.update_id + 1;
            next_offset = Some(next_offset.map_or(acknowledged, |o| o.max(acknowledged)));

            match update.into_inbound() {
                Some(message) => tasks.push(self.dispatch(message)),
                None => tracing::debug!(update_id = acknowledged - 1, "Ignoring non-text update"),
            }
        }

        Ok(PollOutcome { next_offset, tasks })
    }

    fn dispatch(&self, message: InboundMessage) -> JoinHandle<()> {
        let handler = self.handler.clone();
        let failures = self.failures.clone();
        let conversation_id = message.conversation_id;

        // A panicking handler must not take the poller down with it
        tokio::spawn(async move {
            let task = tokio::spawn(async move { handler.handle(message).await });
            if let Err(e) = task.await {
                failures.report(&e, FailureContext::conversation(conversation_id, "poll_dispatch"));
            }
        })
    }

    /// Poll until the process stops. Errors are reported and retried.
    #[mutants::skip] // Infinite loop; poll_once carries the testable logic
    pub async fn run(self) {
        tracing::info!(poll_timeout = ?self.poll_timeout, "Starting Telegram long polling");

        let mut offset = None;
        loop {
            match self.poll_once(offset).await {
                Ok(outcome) => offset = outcome.next_offset,
                Err(e) => {
                    self.failures
                        .report(&e, FailureContext::process("poll_updates"));
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}
