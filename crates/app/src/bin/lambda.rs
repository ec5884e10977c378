//! Planpal - AWS Lambda Runtime
//!
//! Serves the Telegram webhook. Messages are handled before the response is
//! returned because the runtime freezes once the invocation completes.

use std::sync::Arc;

use lambda_http::{run, Error};
use tower_http::trace::TraceLayer;
use tracing::info;

use planpal_app::{body_limit_layer, build_orchestrator, build_store, create_app, webhook_state};
use planpal_common::config::Config;
use planpal_common::{FailureSink, TracingFailureSink};
use planpal_llm::LlmConfig;
use planpal_telegram::{DispatchMode, TelegramClient, TelegramConfig};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .without_time()
        .init();

    info!("Initializing Planpal Lambda");

    let config = Config::from_env().map_err(|e| Error::from(format!("Config error: {}", e)))?;
    let llm_config = LlmConfig::from_env()?;
    let telegram_config = TelegramConfig::from_env()?;

    let failures: Arc<dyn FailureSink> = Arc::new(TracingFailureSink);
    let client = TelegramClient::new(&telegram_config)?;
    let store = build_store(&config)
        .await
        .map_err(|e| Error::from(format!("Store error: {}", e)))?;
    let orchestrator = build_orchestrator(
        &config,
        llm_config,
        store,
        Arc::new(client),
        failures.clone(),
    )
    .map_err(|e| Error::from(format!("App initialization error: {}", e)))?;

    let app = create_app(webhook_state(
        Arc::new(orchestrator),
        failures,
        telegram_config.webhook_secret.clone(),
        DispatchMode::Inline,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(body_limit_layer());

    info!("Planpal Lambda ready to serve requests");

    run(app).await
}
