//! Planpal application composition root
//!
//! Builds the state store, generator and orchestrator from configuration and
//! composes the HTTP router served in webhook mode.

use std::sync::Arc;

use axum::Router;
use planpal_common::config::{Config, StoreBackend};
use planpal_common::{FailureSink, InboundHandler, MessageSender};
use planpal_conversations::{
    ChatStateStore, ConversationOrchestrator, InMemoryChatStateStore, PgChatStateStore,
};
use planpal_llm::{LlmConfig, LlmServiceFactory, TextGenerator};
use planpal_telegram::{DispatchMode, TelegramState};
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;

/// Telegram updates are small; anything larger is not an update
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Create the configured chat state store, applying migrations when asked
pub async fn build_store(config: &Config) -> Result<Arc<dyn ChatStateStore>, anyhow::Error> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory chat state store; state is lost on restart");
            Ok(Arc::new(InMemoryChatStateStore::new()))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres store"))?;

            let pool = PgPool::connect(database_url)
                .await
                .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
            tracing::info!("Database connection established");

            let store = PgChatStateStore::new(pool);
            if config.run_migrations {
                store.migrate().await?;
                tracing::info!("Database migrations applied");
            }

            Ok(Arc::new(store))
        }
    }
}

/// Wire the orchestrator to its collaborators
pub fn build_orchestrator(
    config: &Config,
    llm_config: LlmConfig,
    store: Arc<dyn ChatStateStore>,
    sender: Arc<dyn MessageSender>,
    failures: Arc<dyn FailureSink>,
) -> Result<ConversationOrchestrator, anyhow::Error> {
    let timeout = llm_config.timeout;
    let service = LlmServiceFactory::create(llm_config)?;
    let generator = TextGenerator::new(Arc::from(service)).with_timeout(timeout);

    Ok(
        ConversationOrchestrator::new(store, generator, sender, failures)
            .with_serialization(config.serialize_conversations),
    )
}

/// Webhook state for an orchestrator
pub fn webhook_state(
    handler: Arc<dyn InboundHandler>,
    failures: Arc<dyn FailureSink>,
    secret_token: Option<String>,
    dispatch: DispatchMode,
) -> TelegramState {
    TelegramState {
        handler,
        failures,
        secret_token,
        dispatch,
    }
}

/// Create the main application router
pub fn create_app(state: TelegramState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Planpal v0.0.1-SNAPSHOT" }),
        )
        .merge(planpal_telegram::routes().with_state(state))
}

/// Request body limit applied in front of the router
pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
