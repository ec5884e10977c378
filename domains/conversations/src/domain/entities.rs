//! Domain entities for the Conversations domain
//!
//! `ConversationState` is the canonical record kept per conversation:
//! a step counter that only moves forward and an append-only history of
//! exchanges in arrival order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use planpal_common::ConversationId;

use super::state::{ConversationPhase, StateError};

/// One recorded user message and the reply it received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user_text: String,
    pub assistant_text: String,
}

impl Exchange {
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
        }
    }
}

/// Conversation state entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationState {
    pub conversation_id: ConversationId,
    pub step: i32,
    pub history: Json<Vec<Exchange>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create the initial state for a conversation
    pub fn new(conversation_id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            step: 0,
            history: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase(&self) -> ConversationPhase {
        ConversationPhase::from_step(self.step)
    }

    /// Recorded exchanges in arrival order
    pub fn history(&self) -> &[Exchange] {
        &self.history.0
    }

    /// Record one completed transition
    pub fn advance_step(&mut self) -> Result<(), StateError> {
        self.step = self
            .step
            .checked_add(1)
            .ok_or_else(|| StateError::GuardFailed("Step counter overflow".to_string()))?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Append an exchange to the end of the history
    pub fn append_exchange(&mut self, exchange: Exchange) {
        self.history.0.push(exchange);
        self.updated_at = Utc::now();
    }
}
