//! PostgreSQL chat state store tests
//!
//! Need a reachable database (TEST_DATABASE_URL or DATABASE_URL):
//! `cargo test -p planpal-integration-tests --test chat_state_store_test -- --ignored`

mod common;

use planpal_conversations::{ChatStateStore, Exchange, PgChatStateStore};
use planpal_common::RepositoryError;

use crate::common::{unique_conversation_id, TestConfig};

async fn store() -> anyhow::Result<PgChatStateStore> {
    let config = TestConfig::from_env();
    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    let store = PgChatStateStore::new(pool);
    store.migrate().await?;
    Ok(store)
}

async fn cleanup(store: &PgChatStateStore, conversation_id: i64) {
    sqlx::query("DELETE FROM chat_states WHERE conversation_id = $1")
        .bind(conversation_id)
        .execute(store.pool())
        .await
        .ok();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_get_or_create_is_idempotent() {
    let store = store().await.unwrap();
    let id = unique_conversation_id();

    let created = store.get_or_create(id).await.unwrap();
    assert_eq!(created.step, 0);
    assert!(created.history().is_empty());

    store.advance_step(id).await.unwrap();
    let again = store.get_or_create(id).await.unwrap();
    assert_eq!(again.step, 1);
    assert_eq!(again.created_at, created.created_at);

    cleanup(&store, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_get_or_create_yields_one_record() {
    let store = store().await.unwrap();
    let id = unique_conversation_id();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.get_or_create(id).await })
        })
        .collect();

    for task in tasks {
        let state = task.await.unwrap().unwrap();
        assert_eq!(state.step, 0);
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_states WHERE conversation_id = $1")
        .bind(id)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    cleanup(&store, id).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_advance_step_missing_record() {
    let store = store().await.unwrap();
    let id = unique_conversation_id();

    let result = store.advance_step(id).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
    assert!(store.find(id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_append_exchange_keeps_order() {
    let store = store().await.unwrap();
    let id = unique_conversation_id();
    store.get_or_create(id).await.unwrap();

    store
        .append_exchange(id, &Exchange::new("yes", "Great, let's find you a plan."))
        .await
        .unwrap();
    store
        .append_exchange(id, &Exchange::new("more info", "Sure."))
        .await
        .unwrap();

    let state = store.find(id).await.unwrap().unwrap();
    assert_eq!(
        state.history(),
        &[
            Exchange::new("yes", "Great, let's find you a plan."),
            Exchange::new("more info", "Sure."),
        ]
    );
    assert_eq!(state.step, 0);

    cleanup(&store, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_appends_all_land() {
    let store = store().await.unwrap();
    let id = unique_conversation_id();
    store.get_or_create(id).await.unwrap();

    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .append_exchange(id, &Exchange::new(format!("u{}", i), format!("a{}", i)))
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let state = store.find(id).await.unwrap().unwrap();
    assert_eq!(state.history().len(), 12);

    cleanup(&store, id).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_append_exchange_missing_record() {
    let store = store().await.unwrap();
    let id = unique_conversation_id();

    let result = store.append_exchange(id, &Exchange::new("a", "b")).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}
