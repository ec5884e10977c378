//! State machine for conversation progress
//!
//! Conversation phases: Fresh (step 0) → Engaged (step > 0). Engaged is
//! absorbing; there is no way back to Fresh.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text that opens a conversation
pub const START_COMMAND: &str = "/start";

/// Rejected phase changes
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot apply {event} in phase {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),
}

/// Logical phase derived from a conversation's step counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationPhase {
    /// No completed transition yet
    Fresh,
    /// At least one completed start
    Engaged,
}

impl ConversationPhase {
    pub fn from_step(step: i32) -> Self {
        if step > 0 {
            Self::Engaged
        } else {
            Self::Fresh
        }
    }

    /// Get all valid next phases from the current phase
    pub fn valid_transitions(&self) -> &'static [ConversationPhase] {
        match self {
            Self::Fresh => &[Self::Fresh, Self::Engaged],
            Self::Engaged => &[Self::Engaged],
        }
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Engaged => write!(f, "engaged"),
        }
    }
}

/// Events that an inbound message can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationEvent {
    /// Start command on a fresh conversation: greet and advance the step
    Start,
    /// Anything else on a fresh conversation: tell the user how to start
    Instruct,
    /// Any message on an engaged conversation: generate a reply and record it
    Continue,
}

impl std::fmt::Display for ConversationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Instruct => write!(f, "instruct"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// Conversation state machine
pub struct ConversationStateMachine;

impl ConversationStateMachine {
    /// Decide which event an inbound text triggers in the given phase
    pub fn classify(phase: ConversationPhase, text: &str) -> ConversationEvent {
        match phase {
            ConversationPhase::Fresh if text == START_COMMAND => ConversationEvent::Start,
            ConversationPhase::Fresh => ConversationEvent::Instruct,
            ConversationPhase::Engaged => ConversationEvent::Continue,
        }
    }

    /// Attempt a phase transition
    pub fn transition(
        current: ConversationPhase,
        event: ConversationEvent,
    ) -> Result<ConversationPhase, StateError> {
        let next = match (current, event) {
            (ConversationPhase::Fresh, ConversationEvent::Start) => ConversationPhase::Engaged,
            (ConversationPhase::Fresh, ConversationEvent::Instruct) => ConversationPhase::Fresh,
            (ConversationPhase::Engaged, ConversationEvent::Continue) => {
                ConversationPhase::Engaged
            }
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
