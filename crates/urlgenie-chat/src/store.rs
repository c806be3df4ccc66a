//! Append-only message transcript.

use urlgenie_core::types::{Message, Sender};

use crate::error::ChatError;

/// Id of the seeded welcome message.
pub const WELCOME_ID: &str = "welcome";

/// Text of the seeded welcome message.
pub const WELCOME_MESSAGE: &str = "Hello! I am UrlGenie. Please enter a URL in the sidebar to get started, and I will answer questions based on that website.";

/// Ordered transcript of a session.
///
/// Messages can only be appended; there is no removal or reordering.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript seeded with the welcome message.
    pub fn with_welcome() -> Self {
        Self {
            messages: vec![Message::with_id(WELCOME_ID, Sender::Bot, WELCOME_MESSAGE)],
        }
    }

    /// Append a message to the end of the transcript.
    pub fn append(&mut self, message: Message) -> Result<(), ChatError> {
        if message.id.is_empty() {
            return Err(ChatError::InvalidMessage);
        }
        tracing::trace!(id = %message.id, sender = %message.sender, "Message appended");
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = MessageStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.last().is_none());
    }

    #[test]
    fn test_with_welcome_seeds_exactly_one_message() {
        let store = MessageStore::with_welcome();
        assert_eq!(store.len(), 1);
        let welcome = &store.messages()[0];
        assert_eq!(welcome.id, WELCOME_ID);
        assert_eq!(welcome.sender, Sender::Bot);
        assert_eq!(welcome.text, WELCOME_MESSAGE);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = MessageStore::new();
        store.append(Message::user("first")).unwrap();
        store.append(Message::bot("second")).unwrap();
        store.append(Message::user("third")).unwrap();

        let texts: Vec<&str> = store.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(store.last().unwrap().text, "third");
    }

    #[test]
    fn test_append_rejects_empty_id() {
        let mut store = MessageStore::new();
        let result = store.append(Message::with_id("", Sender::User, "hi"));
        assert!(matches!(result, Err(ChatError::InvalidMessage)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_accepts_empty_text() {
        let mut store = MessageStore::new();
        store.append(Message::bot("")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_recent_returns_tail_oldest_first() {
        let mut store = MessageStore::new();
        for i in 0..15 {
            store.append(Message::user(format!("m{}", i))).unwrap();
        }
        let recent = store.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].text, "m5");
        assert_eq!(recent[9].text, "m14");
    }

    #[test]
    fn test_recent_shorter_than_limit() {
        let mut store = MessageStore::with_welcome();
        store.append(Message::user("hello")).unwrap();
        let recent = store.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, WELCOME_ID);
    }

    #[test]
    fn test_recent_zero() {
        let store = MessageStore::with_welcome();
        assert!(store.recent(0).is_empty());
    }
}
