//! Webhook API for push delivery of Telegram updates

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::{DispatchMode, TelegramState};
pub use routes::routes;
