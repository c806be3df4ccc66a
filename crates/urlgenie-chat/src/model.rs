//! Model collaborator boundary.
//!
//! The coordinator talks to the language model only through [`ModelClient`].
//! A request carries a bounded slice of prior turns, the new user text and
//! the active URL; a reply carries text and grounding citations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use urlgenie_core::types::{Message, SourceCitation};

use crate::error::ModelError;

/// Role of a history turn as understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Model,
}

/// One prior transcript entry as sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub text: String,
}

impl From<&Message> for HistoryTurn {
    fn from(message: &Message) -> Self {
        let role = if message.is_user() {
            HistoryRole::User
        } else {
            HistoryRole::Model
        };
        Self {
            role,
            text: message.text.clone(),
        }
    }
}

/// Convert transcript messages into history turns, preserving order.
pub fn history_turns(messages: &[Message]) -> Vec<HistoryTurn> {
    messages.iter().map(HistoryTurn::from).collect()
}

/// Input to a single model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub history: Vec<HistoryTurn>,
    pub message: String,
    pub target_url: Option<String>,
}

impl ModelRequest {
    /// System instruction derived from the target URL.
    pub fn system_instruction(&self) -> String {
        system_instruction(self.target_url.as_deref())
    }
}

/// Output of a single model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    /// Generated text. `None` or blank means the model produced nothing.
    pub text: Option<String>,
    /// Citations in provider order, possibly with duplicate URIs.
    pub sources: Vec<SourceCitation>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceCitation>) -> Self {
        self.sources = sources;
        self
    }
}

/// A language model that answers questions grounded on a target URL.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Produce a single reply for `request`.
    async fn generate(&self, request: ModelRequest) -> Result<ModelReply, ModelError>;
}

/// Build the system instruction for the given target URL.
pub fn system_instruction(target_url: Option<&str>) -> String {
    match target_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => format!(
            "You are a helpful AI assistant acting as a \"Dialogflow\" style agent for a specific website.\n\n\
             The user has provided the following Target URL: {url}\n\n\
             Your goal is to answer questions strictly based on the content, context, and information available at that Target URL.\n\
             If the user asks something unrelated to the URL, politely steer them back to the topic of the website.\n\n\
             Be concise, professional, and helpful. Use the Search tool to verify information about the URL if needed."
        ),
        None => "You are a helpful AI assistant. The user has not provided a URL yet, so ask them to provide one to start the specific context chat.".to_string(),
    }
}
