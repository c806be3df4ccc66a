//! Active context URL management.
//!
//! The context manager holds the single page the assistant answers about.
//! Setting or clearing it appends a bot notice to the transcript so the
//! change is visible in the conversation.

use urlgenie_core::types::Message;

use crate::error::ChatError;
use crate::store::MessageStore;

/// Notice appended when the context is cleared.
pub const CLEARED_NOTICE: &str = "Context cleared. Please enter a new URL.";

/// Notice appended when the context is set to `url`.
pub fn context_set_notice(url: &str) -> String {
    format!("Context set to: {}. What would you like to know?", url)
}

/// Holds the active target URL. No history of prior URLs is kept.
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    active_url: Option<String>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_url(&self) -> Option<&str> {
        self.active_url.as_deref()
    }

    pub fn has_context(&self) -> bool {
        self.active_url.is_some()
    }

    /// Replace the active URL and append a notice.
    ///
    /// The URL is trimmed first; a blank URL is rejected without touching
    /// the transcript. Returns the appended notice.
    pub fn set_url(&mut self, url: &str, store: &mut MessageStore) -> Result<Message, ChatError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ChatError::EmptyUrl);
        }

        let notice = Message::bot(context_set_notice(url));
        store.append(notice.clone())?;

        if let Some(previous) = self.active_url.replace(url.to_string()) {
            tracing::info!(previous = %previous, url = %url, "Context URL replaced");
        } else {
            tracing::info!(url = %url, "Context URL set");
        }
        Ok(notice)
    }

    /// Clear the active URL and append a notice.
    ///
    /// The notice is appended even when no URL was set.
    pub fn clear_url(&mut self, store: &mut MessageStore) -> Result<Message, ChatError> {
        let notice = Message::bot(CLEARED_NOTICE);
        store.append(notice.clone())?;

        match self.active_url.take() {
            Some(previous) => tracing::info!(previous = %previous, "Context URL cleared"),
            None => tracing::debug!("Context clear requested with no URL set"),
        }
        Ok(notice)
    }
}
