// Planpal - Local Server
//
// Runs the bot with Telegram long polling (default) or as a webhook server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use planpal_app::{body_limit_layer, build_orchestrator, build_store, create_app, webhook_state};
use planpal_common::config::Config;
use planpal_common::{FailureSink, TracingFailureSink};
use planpal_llm::LlmConfig;
use planpal_telegram::{DispatchMode, Poller, TelegramClient, TelegramConfig, TelegramMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .pretty()
        .init();

    info!("Starting Planpal local server");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let llm_config = LlmConfig::from_env()?;
    let telegram_config = TelegramConfig::from_env()?;

    info!(?llm_config, ?telegram_config, "Configuration loaded successfully");

    let failures: Arc<dyn FailureSink> = Arc::new(TracingFailureSink);
    let client = TelegramClient::new(&telegram_config)?;
    let store = build_store(&config).await?;
    let orchestrator = Arc::new(build_orchestrator(
        &config,
        llm_config,
        store,
        Arc::new(client.clone()),
        failures.clone(),
    )?);

    match telegram_config.mode {
        TelegramMode::Polling => {
            // getUpdates is refused while a webhook is registered
            client.delete_webhook().await?;

            let poller = Poller::new(
                client,
                orchestrator,
                failures,
                telegram_config.poll_timeout,
            );

            tokio::select! {
                _ = poller.run() => {},
                _ = shutdown_signal() => {},
            }
        }
        TelegramMode::Webhook => {
            let webhook_url = telegram_config.webhook_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("TELEGRAM_WEBHOOK_URL is required in webhook mode")
            })?;
            client
                .set_webhook(webhook_url, telegram_config.webhook_secret.as_deref())
                .await?;
            info!(webhook_url, "Webhook registered");

            let app = create_app(webhook_state(
                orchestrator,
                failures,
                telegram_config.webhook_secret.clone(),
                DispatchMode::Spawn,
            ))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(body_limit_layer())
                    .into_inner(),
            );

            let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
            let listener = tokio::net::TcpListener::bind(addr).await?;

            info!("Server listening on http://{}", addr);
            info!("Health check available at http://{}/health", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
