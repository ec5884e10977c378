//! Route definitions for the Telegram webhook

use axum::{routing::post, Router};

use super::handlers;
use super::middleware::TelegramState;

/// Create the Telegram webhook routes
pub fn routes() -> Router<TelegramState> {
    Router::new().route("/v1/telegram/webhook", post(handlers::receive_update))
}
