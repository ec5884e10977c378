//! End-to-end tests over real HTTP clients
//!
//! A fake Telegram Bot API and a fake OpenAI endpoint run on ephemeral ports;
//! updates enter through the webhook router or the long-polling loop and the
//! replies are observed as `sendMessage` calls on the fake Telegram side.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use planpal_app::{build_orchestrator, create_app, webhook_state};
use planpal_common::config::{Config, StoreBackend};
use planpal_common::mock::MockFailureSink;
use planpal_conversations::{ChatStateStore, ConversationOrchestrator, InMemoryChatStateStore};
use planpal_llm::LlmConfig;
use planpal_telegram::{DispatchMode, Poller, TelegramClient, TelegramConfig, TelegramMode};

use crate::common::serve;

type Captured = Arc<Mutex<Vec<Value>>>;

/// Fake Bot API: records sendMessage bodies, hands out `updates` once
async fn fake_telegram(updates: Vec<Value>) -> (String, Captured) {
    let sent: Captured = Arc::new(Mutex::new(Vec::new()));
    let pending = Arc::new(Mutex::new(Some(updates)));

    let sink = sent.clone();
    let router = Router::new()
        .route(
            "/bot123:abc/sendMessage",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    Json(json!({"ok": true, "result": {"message_id": 1, "chat": {"id": 0}}}))
                }
            }),
        )
        .route(
            "/bot123:abc/getUpdates",
            post(move || {
                let pending = pending.clone();
                async move {
                    let batch = pending.lock().unwrap().take().unwrap_or_default();
                    if batch.is_empty() {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    Json(json!({"ok": true, "result": batch}))
                }
            }),
        );

    (serve(router).await, sent)
}

/// Fake chat completions endpoint answering every prompt with `reply`
async fn fake_openai(reply: &'static str) -> String {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move || async move {
            Json(json!({
                "model": "gpt-3.5-turbo",
                "choices": [{"message": {"role": "assistant", "content": reply}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5}
            }))
        }),
    );
    serve(router).await
}

fn telegram_config(api_base_url: String) -> TelegramConfig {
    TelegramConfig {
        token: "123:abc".to_string(),
        mode: TelegramMode::Webhook,
        api_base_url,
        webhook_url: None,
        webhook_secret: Some("s3cret".to_string()),
        poll_timeout: Duration::from_secs(1),
    }
}

fn app_config() -> Config {
    Config {
        database_url: None,
        store_backend: StoreBackend::Memory,
        run_migrations: false,
        serialize_conversations: true,
        port: 0,
    }
}

fn openai_config(base_url: String) -> LlmConfig {
    LlmConfig {
        provider: "openai".to_string(),
        api_key: "sk-test".to_string(),
        default_model: "gpt-3.5-turbo".to_string(),
        base_url: Some(base_url),
        timeout: Duration::from_secs(5),
    }
}

fn orchestrator(
    store: &InMemoryChatStateStore,
    client: TelegramClient,
    llm_config: LlmConfig,
    failures: &MockFailureSink,
) -> ConversationOrchestrator {
    build_orchestrator(
        &app_config(),
        llm_config,
        Arc::new(store.clone()),
        Arc::new(client),
        Arc::new(failures.clone()),
    )
    .unwrap()
}

fn webhook_request(chat_id: i64, text: &str, secret: &str) -> Request<Body> {
    let update = json!({
        "update_id": 100,
        "message": {"message_id": 1, "chat": {"id": chat_id}, "text": text}
    });
    Request::post("/v1/telegram/webhook")
        .header("content-type", "application/json")
        .header("x-telegram-bot-api-secret-token", secret)
        .body(Body::from(update.to_string()))
        .unwrap()
}

#[test_log::test(tokio::test)]
async fn test_webhook_start_then_reply() {
    let (telegram_url, sent) = fake_telegram(Vec::new()).await;
    let openai_url = fake_openai("Hi! Looking for insurance?").await;
    let config = telegram_config(telegram_url);
    let client = TelegramClient::new(&config).unwrap();
    let store = InMemoryChatStateStore::new();
    let failures = MockFailureSink::new();

    let handler = Arc::new(orchestrator(&store, client, openai_config(openai_url), &failures));
    let app = create_app(webhook_state(
        handler,
        Arc::new(failures.clone()),
        config.webhook_secret.clone(),
        DispatchMode::Inline,
    ));

    let response = app
        .clone()
        .oneshot(webhook_request(42, "/start", "s3cret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(webhook_request(42, "yes", "s3cret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["chat_id"], 42);
    assert_eq!(sent[0]["text"], "Hi! Looking for insurance?");

    let state = store.find(42).await.unwrap().unwrap();
    assert_eq!(state.step, 1);
    assert_eq!(state.history().len(), 1);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_webhook_rejects_wrong_secret() {
    let (telegram_url, sent) = fake_telegram(Vec::new()).await;
    let config = telegram_config(telegram_url);
    let client = TelegramClient::new(&config).unwrap();
    let store = InMemoryChatStateStore::new();
    let failures = MockFailureSink::new();

    let handler = Arc::new(orchestrator(
        &store,
        client,
        openai_config("http://127.0.0.1:1".to_string()),
        &failures,
    ));
    let app = create_app(webhook_state(
        handler,
        Arc::new(failures.clone()),
        config.webhook_secret.clone(),
        DispatchMode::Inline,
    ));

    let response = app
        .oneshot(webhook_request(42, "/start", "wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(sent.lock().unwrap().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unreachable_llm_falls_back_to_default_greeting() {
    let (telegram_url, sent) = fake_telegram(Vec::new()).await;
    let config = telegram_config(telegram_url);
    let client = TelegramClient::new(&config).unwrap();
    let store = InMemoryChatStateStore::new();
    let failures = MockFailureSink::new();

    let handler = Arc::new(orchestrator(
        &store,
        client,
        openai_config("http://127.0.0.1:1".to_string()),
        &failures,
    ));
    let app = create_app(webhook_state(
        handler,
        Arc::new(failures.clone()),
        config.webhook_secret.clone(),
        DispatchMode::Inline,
    ));

    app.oneshot(webhook_request(8, "/start", "s3cret"))
        .await
        .unwrap();

    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["text"], "Are you looking for a health insurance plan?");
    assert_eq!(store.find(8).await.unwrap().unwrap().step, 1);
    assert_eq!(failures.operations(), vec!["generate_greeting"]);
}

#[tokio::test]
async fn test_polling_dispatches_updates() {
    let updates = vec![
        json!({"update_id": 5, "message": {"message_id": 1, "chat": {"id": 77}, "text": "hello"}}),
        json!({"update_id": 6, "message": {"message_id": 2, "chat": {"id": 78}}}),
    ];
    let (telegram_url, sent) = fake_telegram(updates).await;
    let openai_url = fake_openai("unused").await;
    let mut config = telegram_config(telegram_url);
    config.mode = TelegramMode::Polling;
    let client = TelegramClient::new(&config).unwrap();
    let store = InMemoryChatStateStore::new();
    let failures = MockFailureSink::new();

    let handler = Arc::new(orchestrator(
        &store,
        client.clone(),
        openai_config(openai_url),
        &failures,
    ));
    let poller = Poller::new(
        client,
        handler,
        Arc::new(failures.clone()),
        config.poll_timeout,
    );

    let outcome = poller.poll_once(None).await.unwrap();
    assert_eq!(outcome.next_offset, Some(7));
    for task in outcome.tasks {
        task.await.unwrap();
    }

    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], 77);
    assert_eq!(sent[0]["text"], "Type /start to begin the conversation again.");
    assert!(store.find(78).await.unwrap().is_none());
}
