//! The explicit chat session object.
//!
//! A `ChatSession` bundles the transcript, the context URL and the pending
//! flag. It is created once at startup and shared by reference with every
//! surface that drives it.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use urlgenie_core::config::ChatConfig;
use urlgenie_core::types::Message;

use crate::context::ContextManager;
use crate::error::ChatError;
use crate::store::MessageStore;

/// Session shared between the coordinator and presentation surfaces.
///
/// The lock is never held across an `.await`.
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub active_url: Option<String>,
    pub pending: bool,
}

/// Conversation state for a single user session.
#[derive(Debug, Default)]
pub struct ChatSession {
    store: MessageStore,
    context: ContextManager,
    pending: bool,
}

impl ChatSession {
    /// Create a session according to `config`.
    pub fn new(config: &ChatConfig) -> Self {
        let store = if config.seed_welcome {
            MessageStore::with_welcome()
        } else {
            MessageStore::new()
        };
        Self {
            store,
            context: ContextManager::new(),
            pending: false,
        }
    }

    /// Wrap the session for sharing.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn transcript(&self) -> &MessageStore {
        &self.store
    }

    pub fn active_url(&self) -> Option<&str> {
        self.context.active_url()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Set the context URL. See [`ContextManager::set_url`].
    pub fn set_url(&mut self, url: &str) -> Result<Message, ChatError> {
        self.context.set_url(url, &mut self.store)
    }

    /// Clear the context URL. See [`ContextManager::clear_url`].
    pub fn clear_url(&mut self) -> Result<Message, ChatError> {
        self.context.clear_url(&mut self.store)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.store.messages().to_vec(),
            active_url: self.context.active_url().map(str::to_owned),
            pending: self.pending,
        }
    }

    pub(crate) fn append(&mut self, message: Message) -> Result<(), ChatError> {
        self.store.append(message)
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }
}

/// Lock a shared session, mapping poisoning to a chat error.
pub fn lock_session(session: &SharedSession) -> Result<MutexGuard<'_, ChatSession>, ChatError> {
    session
        .lock()
        .map_err(|e| ChatError::SessionPoisoned(e.to_string()))
}
