//! Conversations domain: chat state machine, state persistence, orchestration

pub mod domain;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{ConversationState, Exchange};
pub use domain::state::{
    ConversationEvent, ConversationPhase, ConversationStateMachine, StateError, START_COMMAND,
};

pub use error::OrchestrationError;
pub use locks::ConversationLocks;
pub use orchestrator::ConversationOrchestrator;

// Re-export repository types
pub use repository::{ChatStateStore, InMemoryChatStateStore, PgChatStateStore};
