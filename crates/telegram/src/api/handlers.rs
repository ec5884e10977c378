//! Telegram webhook handler

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use planpal_common::{secret_matches, Error, FailureContext, JsonBody, Result};

use super::middleware::{DispatchMode, TelegramState};
use crate::types::Update;

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Receive one update pushed by Telegram.
///
/// Always answers 200 for well-formed, authenticated updates (including ones
/// that carry no text) so Telegram does not redeliver them.
pub async fn receive_update(
    State(state): State<TelegramState>,
    headers: HeaderMap,
    JsonBody(update): JsonBody<Update>,
) -> Result<StatusCode> {
    if let Some(expected) = state.secret_token.as_deref() {
        let presented = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !secret_matches(presented, expected) {
            return Err(Error::Unauthorized(
                "Invalid webhook secret token".to_string(),
            ));
        }
    }

    let update_id = update.update_id;
    let Some(message) = update.into_inbound() else {
        tracing::debug!(update_id, "Ignoring non-text update");
        return Ok(StatusCode::OK);
    };

    match state.dispatch {
        DispatchMode::Spawn => {
            let handler = state.handler.clone();
            let failures = state.failures.clone();
            let conversation_id = message.conversation_id;
            tokio::spawn(async move {
                let task = tokio::spawn(async move { handler.handle(message).await });
                if let Err(e) = task.await {
                    failures.report(
                        &e,
                        FailureContext::conversation(conversation_id, "webhook_dispatch"),
                    );
                }
            });
        }
        DispatchMode::Inline => state.handler.handle(message).await,
    }

    Ok(StatusCode::OK)
}
