//! Postgres-backed chat state store

use planpal_common::{ConversationId, RepositoryError};
use sqlx::types::Json;
use sqlx::PgPool;

use super::ChatStateStore;
use crate::domain::entities::{ConversationState, Exchange};

#[derive(Clone)]
pub struct PgChatStateStore {
    pool: PgPool,
}

impl PgChatStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Unavailable(format!("Migration failed: {}", e)))
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ChatStateStore for PgChatStateStore {
    async fn get_or_create(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ConversationState, RepositoryError> {
        // The primary key resolves concurrent inserts; the loser reads the winner's row
        let created = sqlx::query_as::<_, ConversationState>(
            r#"
            INSERT INTO chat_states (conversation_id)
            VALUES ($1)
            ON CONFLICT (conversation_id) DO NOTHING
            RETURNING conversation_id, step, history, created_at, updated_at
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(state) = created {
            tracing::debug!(conversation_id, "Created conversation state");
            return Ok(state);
        }

        self.find(conversation_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn advance_step(&self, conversation_id: ConversationId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_states SET
                step = step + 1,
                updated_at = NOW()
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn append_exchange(
        &self,
        conversation_id: ConversationId,
        exchange: &Exchange,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_states SET
                history = history || jsonb_build_array($2::jsonb),
                updated_at = NOW()
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .bind(Json(exchange))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn find(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationState>, RepositoryError> {
        let state = sqlx::query_as::<_, ConversationState>(
            r#"
            SELECT conversation_id, step, history, created_at, updated_at
            FROM chat_states
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }
}
