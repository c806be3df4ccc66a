//! Error types for the conversational core.

use urlgenie_core::error::UrlGenieError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message id cannot be empty")]
    InvalidMessage,
    #[error("context URL cannot be empty")]
    EmptyUrl,
    #[error("session lock poisoned: {0}")]
    SessionPoisoned(String),
    #[error("voice input is not supported on this platform")]
    VoiceUnavailable,
    #[error("voice error: {0}")]
    Voice(#[from] VoiceError),
}

/// Failure reported by a model collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("API key is not configured")]
    MissingApiKey,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Failure reported by a speech recognizer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoiceError {
    #[error("voice capture is already active")]
    AlreadyListening,
    #[error("recognition failed: {0}")]
    Recognition(String),
}

impl From<ChatError> for UrlGenieError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Voice(e) => UrlGenieError::Voice(e.to_string()),
            ChatError::VoiceUnavailable => UrlGenieError::Voice(err.to_string()),
            other => UrlGenieError::Chat(other.to_string()),
        }
    }
}
