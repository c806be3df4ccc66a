use thiserror::Error;
use urlgenie_chat::ModelError;

/// Errors from the Gemini HTTP client.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode Gemini response: {0}")]
    Decode(String),
}

impl From<GeminiError> for ModelError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingApiKey => ModelError::MissingApiKey,
            GeminiError::Http(e) => ModelError::Transport(e.to_string()),
            GeminiError::Status { status, body } => ModelError::Status { status, body },
            GeminiError::Decode(msg) => ModelError::InvalidResponse(msg),
        }
    }
}
