//! Conversation orchestration
//!
//! For every inbound message the orchestrator resolves the conversation's
//! state, classifies the message, and drives the matching transition:
//!
//! - Fresh + start command: generate a greeting (falling back to a fixed one),
//!   send it and advance the step
//! - Fresh + anything else: send the start instructions, nothing is stored
//! - Engaged: generate a reply from the user's text, send it and record the
//!   exchange; a failed turn sends an apology and records nothing
//!
//! Failures never reach the user as raw errors. They are reported to the
//! failure sink and answered with a fixed text.

use std::sync::Arc;

use planpal_common::{
    ConversationId, FailureContext, FailureSink, InboundHandler, InboundMessage, MessageSender,
};
use planpal_llm::TextGenerator;

use crate::domain::entities::{ConversationState, Exchange};
use crate::domain::state::{ConversationEvent, ConversationStateMachine};
use crate::error::OrchestrationError;
use crate::locks::ConversationLocks;
use crate::repository::ChatStateStore;

/// Prompt that asks for the opening greeting
pub const OPENING_PROMPT: &str =
    "Ask the user if they are looking for a health insurance plan in a friendly tone.";

/// Greeting sent when the opening generation fails
pub const DEFAULT_GREETING: &str = "Are you looking for a health insurance plan?";

/// Reply to anything but the start command on a fresh conversation
pub const START_INSTRUCTIONS: &str = "Type /start to begin the conversation again.";

/// Reply when an engaged turn cannot be generated
pub const TURN_APOLOGY: &str = "An error occurred. Please try again.";

/// Reply when handling the message failed as a whole
pub const DISPATCH_APOLOGY: &str = "An error occurred. Please try again later.";

/// Prompt for an engaged turn
pub fn continuation_prompt(user_text: &str) -> String {
    format!("User said: {}. Continue the conversation.", user_text)
}

/// Drives conversations through their state machine
#[derive(Clone)]
pub struct ConversationOrchestrator {
    store: Arc<dyn ChatStateStore>,
    generator: TextGenerator,
    sender: Arc<dyn MessageSender>,
    failures: Arc<dyn FailureSink>,
    locks: Option<ConversationLocks>,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<dyn ChatStateStore>,
        generator: TextGenerator,
        sender: Arc<dyn MessageSender>,
        failures: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            store,
            generator,
            sender,
            failures,
            locks: Some(ConversationLocks::new()),
        }
    }

    /// Handle messages for one conversation one at a time (the default) or
    /// let them interleave freely
    pub fn with_serialization(mut self, serialize: bool) -> Self {
        self.locks = serialize.then(ConversationLocks::new);
        self
    }

    /// Handle one inbound message end to end. Never fails.
    pub async fn handle_message(&self, message: InboundMessage) {
        let conversation_id = message.conversation_id;

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(conversation_id).await),
            None => None,
        };

        if let Err(e) = self.dispatch(&message).await {
            self.report(&e, conversation_id, "dispatch");
            self.sender.send(conversation_id, DISPATCH_APOLOGY).await;
        }
    }

    /// Resolve state and route to the transition the message triggers
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<(), OrchestrationError> {
        let state = self.store.get_or_create(message.conversation_id).await?;
        let phase = state.phase();
        let event = ConversationStateMachine::classify(phase, &message.text);
        let next = ConversationStateMachine::transition(phase, event)?;

        tracing::debug!(
            conversation_id = message.conversation_id,
            step = state.step,
            from = %phase,
            to = %next,
            event = %event,
            "Dispatching message"
        );

        match event {
            ConversationEvent::Start => self.start_conversation(&state).await,
            ConversationEvent::Instruct => {
                self.sender
                    .send(state.conversation_id, START_INSTRUCTIONS)
                    .await;
                Ok(())
            }
            ConversationEvent::Continue => {
                self.continue_conversation(&state, &message.text).await
            }
        }
    }

    /// Fresh → Engaged. The step advances even when the greeting fell back.
    async fn start_conversation(&self, state: &ConversationState) -> Result<(), OrchestrationError> {
        let conversation_id = state.conversation_id;

        let greeting = match self.generator.generate(OPENING_PROMPT).await {
            Ok(text) => text,
            Err(e) => {
                let e = OrchestrationError::Generation(e);
                self.report(&e, conversation_id, "generate_greeting");
                DEFAULT_GREETING.to_string()
            }
        };

        self.sender.send(conversation_id, &greeting).await;

        if let Err(e) = self.store.advance_step(conversation_id).await {
            self.report(&e, conversation_id, "advance_step");
            return Ok(());
        }

        tracing::info!(conversation_id, "Conversation started");
        Ok(())
    }

    /// Engaged turn. Only successful turns leave a trace in the history; a reply
    /// that could not be recorded is followed by the turn apology.
    async fn continue_conversation(
        &self,
        state: &ConversationState,
        user_text: &str,
    ) -> Result<(), OrchestrationError> {
        let conversation_id = state.conversation_id;

        let reply = match self.generator.generate(&continuation_prompt(user_text)).await {
            Ok(text) => text,
            Err(e) => {
                let e = OrchestrationError::Generation(e);
                self.report(&e, conversation_id, "generate_reply");
                self.sender.send(conversation_id, TURN_APOLOGY).await;
                return Ok(());
            }
        };

        self.sender.send(conversation_id, &reply).await;

        let exchange = Exchange::new(user_text, reply);
        if let Err(e) = self.store.append_exchange(conversation_id, &exchange).await {
            self.report(&e, conversation_id, "append_exchange");
            self.sender.send(conversation_id, TURN_APOLOGY).await;
        }

        Ok(())
    }

    fn report(
        &self,
        error: &(dyn std::error::Error + Send + Sync),
        conversation_id: ConversationId,
        operation: &'static str,
    ) {
        tracing::warn!(conversation_id, operation, error = %error, "Message handling failed");
        self.failures
            .report(error, FailureContext::conversation(conversation_id, operation));
    }
}

#[async_trait::async_trait]
impl InboundHandler for ConversationOrchestrator {
    async fn handle(&self, message: InboundMessage) {
        self.handle_message(message).await;
    }
}
