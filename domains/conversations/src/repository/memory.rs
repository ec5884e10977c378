//! In-memory chat state store
//!
//! Used when no database is configured and throughout the tests. Every
//! operation runs under one mutex, which gives the same atomicity the
//! Postgres store gets from single-statement updates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use planpal_common::{ConversationId, RepositoryError};

use super::ChatStateStore;
use crate::domain::entities::{ConversationState, Exchange};

#[derive(Debug, Clone)]
pub struct InMemoryChatStateStore {
    states: Arc<Mutex<HashMap<ConversationId, ConversationState>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryChatStateStore {
    fn default() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryChatStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while unavailable every operation fails
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored conversations
    pub fn len(&self) -> usize {
        self.states.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ConversationId, ConversationState>>, RepositoryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "In-memory store marked unavailable".to_string(),
            ));
        }
        self.states
            .lock()
            .map_err(|_| RepositoryError::Unavailable("In-memory store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl ChatStateStore for InMemoryChatStateStore {
    async fn get_or_create(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ConversationState, RepositoryError> {
        let mut states = self.lock()?;
        let state = states
            .entry(conversation_id)
            .or_insert_with(|| ConversationState::new(conversation_id));
        Ok(state.clone())
    }

    async fn advance_step(&self, conversation_id: ConversationId) -> Result<(), RepositoryError> {
        let mut states = self.lock()?;
        let state = states
            .get_mut(&conversation_id)
            .ok_or(RepositoryError::NotFound)?;
        state
            .advance_step()
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))
    }

    async fn append_exchange(
        &self,
        conversation_id: ConversationId,
        exchange: &Exchange,
    ) -> Result<(), RepositoryError> {
        let mut states = self.lock()?;
        let state = states
            .get_mut(&conversation_id)
            .ok_or(RepositoryError::NotFound)?;
        state.append_exchange(exchange.clone());
        Ok(())
    }

    async fn find(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationState>, RepositoryError> {
        Ok(self.lock()?.get(&conversation_id).cloned())
    }
}
