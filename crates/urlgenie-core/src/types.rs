//! Shared domain types for the UrlGenie transcript.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Sender
// =============================================================================

/// Author of a transcript message.
///
/// Serialized as `"user"` / `"model"`, the role names the model provider uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(rename = "model")]
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "model"),
        }
    }
}

// =============================================================================
// SourceCitation
// =============================================================================

/// A (title, uri) pair returned alongside a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub uri: String,
}

impl SourceCitation {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

// =============================================================================
// Message
// =============================================================================

/// One entry of the transcript.
///
/// Messages are never edited after creation; the store only hands out shared
/// references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within a session.
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Citations backing a bot answer. `None` rather than an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceCitation>>,
}

impl Message {
    /// Create a message with a freshly generated id.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), sender, text)
    }

    /// Create a message with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            sources: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    /// Attach citations. An empty list is stored as `None`.
    pub fn with_sources(mut self, sources: Vec<SourceCitation>) -> Self {
        self.sources = if sources.is_empty() {
            None
        } else {
            Some(sources)
        };
        self
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

// =============================================================================
// Tests
// =============================================================================
