//! Repository implementations for the Conversations domain

pub mod chat_states;
pub mod memory;

use planpal_common::{ConversationId, RepositoryError};

use crate::domain::entities::{ConversationState, Exchange};

pub use chat_states::PgChatStateStore;
pub use memory::InMemoryChatStateStore;

/// Durable per-conversation state.
///
/// Implementations must guarantee:
/// - `get_or_create` never produces two records for one id, even when
///   called concurrently
/// - `advance_step` and `append_exchange` are single atomic updates, so
///   concurrent appends for one conversation all land
#[async_trait::async_trait]
pub trait ChatStateStore: Send + Sync {
    /// Return the existing record or create one with step 0 and no history
    async fn get_or_create(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ConversationState, RepositoryError>;

    /// Increment step by one. `NotFound` when the record does not exist.
    async fn advance_step(&self, conversation_id: ConversationId) -> Result<(), RepositoryError>;

    /// Append one exchange to the end of the history
    async fn append_exchange(
        &self,
        conversation_id: ConversationId,
        exchange: &Exchange,
    ) -> Result<(), RepositoryError>;

    /// Look up a record without creating it
    async fn find(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationState>, RepositoryError>;
}
