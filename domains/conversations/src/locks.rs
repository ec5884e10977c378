//! Per-conversation serialization
//!
//! Messages for the same conversation are handled one at a time; different
//! conversations never wait on each other. Entries are dropped from the
//! registry once the last holder or waiter releases them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use planpal_common::ConversationId;
use tokio::sync::OwnedMutexGuard;

/// An entry's lock and the number of holders and waiters registered on it
#[derive(Debug, Default)]
struct Entry {
    lock: Arc<tokio::sync::Mutex<()>>,
    registered: usize,
}

type Registry = Arc<Mutex<HashMap<ConversationId, Entry>>>;

#[derive(Debug, Clone, Default)]
pub struct ConversationLocks {
    entries: Registry,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other message for `conversation_id` is in flight.
    ///
    /// Dropping the returned future while it waits leaves the registry clean.
    pub async fn acquire(&self, conversation_id: ConversationId) -> ConversationGuard {
        let (registration, lock) = self.register(conversation_id);
        let guard = lock.lock_owned().await;

        ConversationGuard {
            _guard: guard,
            registration,
        }
    }

    fn register(&self, conversation_id: ConversationId) -> (Registration, Arc<tokio::sync::Mutex<()>>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(conversation_id).or_default();
        entry.registered += 1;

        let registration = Registration {
            conversation_id,
            entries: self.entries.clone(),
        };
        (registration, entry.lock.clone())
    }

    /// Conversations with a holder or waiter
    pub fn active(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}

/// Held for the duration of one message
#[derive(Debug)]
pub struct ConversationGuard {
    // Fields drop in order: the lock is released before deregistering
    _guard: OwnedMutexGuard<()>,
    registration: Registration,
}

impl ConversationGuard {
    pub fn conversation_id(&self) -> ConversationId {
        self.registration.conversation_id
    }
}

/// A holder's or waiter's claim on a registry entry
#[derive(Debug)]
struct Registration {
    conversation_id: ConversationId,
    entries: Registry,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get_mut(&self.conversation_id) {
            entry.registered = entry.registered.saturating_sub(1);
            if entry.registered == 0 {
                entries.remove(&self.conversation_id);
            }
        }
    }
}
