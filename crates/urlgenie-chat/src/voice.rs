//! Voice input capability.
//!
//! A [`SpeechRecognizer`] performs one listen per `start` and reports a single
//! final transcript (or an error) on a one-shot subscription. [`VoiceInput`]
//! tracks the listen lifecycle with explicit states:
//! - Idle -> Listening (toggle / start)
//! - Listening -> Idle (toggle / stop, or transcript received)
//! - Listening -> Error (recognition failed)
//! - Error -> Listening (toggle / start)
//!
//! Voice input only ever edits the input draft; it never sends a message and
//! never affects a pending request.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::{ChatError, VoiceError};

/// Receives the single final result of one listen.
///
/// The recognizer dropping the sender without a result means the listen
/// ended with nothing recognized.
pub type VoiceSubscription = oneshot::Receiver<Result<String, VoiceError>>;

/// Platform speech-to-text capability.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin listening in `language` (a BCP 47 tag such as "en-US").
    fn start(&self, language: &str) -> Result<VoiceSubscription, VoiceError>;

    /// Stop the current listen. Idempotent.
    fn stop(&self);
}

/// Listen lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceState {
    Idle,
    Listening,
    Error,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Listening => write!(f, "Listening"),
            VoiceState::Error => write!(f, "Error"),
        }
    }
}

// =============================================================================
// InputDraft
// =============================================================================

/// Text the user is composing before sending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDraft {
    text: String,
}

impl InputDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Take the draft, leaving it empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Append a recognized transcript, space-joined after the trimmed draft.
    pub fn append_transcript(&mut self, transcript: &str) {
        if transcript.is_empty() {
            return;
        }
        let trimmed = self.text.trim();
        self.text = if trimmed.is_empty() {
            transcript.to_string()
        } else {
            format!("{} {}", trimmed, transcript)
        };
    }
}

// =============================================================================
// VoiceInput
// =============================================================================

/// Voice capture state machine with at most one live subscription.
pub struct VoiceInput {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    language: String,
    state: VoiceState,
    subscription: Option<VoiceSubscription>,
}

impl fmt::Debug for VoiceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceInput")
            .field("has_recognizer", &self.recognizer.is_some())
            .field("language", &self.language)
            .field("state", &self.state)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

impl VoiceInput {
    /// Create a voice input. `None` means the platform has no recognizer.
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, language: impl Into<String>) -> Self {
        Self {
            recognizer,
            language: language.into(),
            state: VoiceState::Idle,
            subscription: None,
        }
    }

    /// Voice input with no recognizer.
    pub fn unavailable() -> Self {
        Self::new(None, "en-US")
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Stop when listening, otherwise start.
    pub fn toggle(&mut self) -> Result<VoiceState, ChatError> {
        if self.state == VoiceState::Listening {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.state)
    }

    /// Start a listen.
    ///
    /// Fails with [`ChatError::VoiceUnavailable`] when there is no recognizer,
    /// leaving the state untouched.
    pub fn start(&mut self) -> Result<(), ChatError> {
        let recognizer = self.recognizer.as_ref().ok_or(ChatError::VoiceUnavailable)?;
        if self.state == VoiceState::Listening {
            return Err(VoiceError::AlreadyListening.into());
        }

        match recognizer.start(&self.language) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.state = VoiceState::Listening;
                tracing::info!(language = %self.language, "Voice capture started");
                Ok(())
            }
            Err(e) => {
                self.state = VoiceState::Error;
                tracing::error!(error = %e, "Speech recognition failed to start");
                Err(e.into())
            }
        }
    }

    /// Stop the current listen and drop its subscription.
    pub fn stop(&mut self) {
        if self.state != VoiceState::Listening {
            return;
        }
        if let Some(ref recognizer) = self.recognizer {
            recognizer.stop();
        }
        self.subscription = None;
        self.state = VoiceState::Idle;
        tracing::info!("Voice capture stopped");
    }

    /// Check for a finished listen without waiting.
    ///
    /// Returns `None` while still listening or when nothing is subscribed.
    /// A recognized transcript is appended to `draft`.
    pub fn poll(&mut self, draft: &mut InputDraft) -> Option<Result<String, VoiceError>> {
        let subscription = self.subscription.as_mut()?;
        match subscription.try_recv() {
            Ok(result) => {
                self.subscription = None;
                self.finish(Some(result), draft)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.subscription = None;
                self.finish(None, draft)
            }
        }
    }

    /// Wait for the current listen to finish. See [`VoiceInput::poll`].
    pub async fn wait(&mut self, draft: &mut InputDraft) -> Option<Result<String, VoiceError>> {
        let subscription = self.subscription.take()?;
        let result = subscription.await.ok();
        self.finish(result, draft)
    }

    fn finish(
        &mut self,
        result: Option<Result<String, VoiceError>>,
        draft: &mut InputDraft,
    ) -> Option<Result<String, VoiceError>> {
        match result {
            Some(Ok(transcript)) => {
                self.state = VoiceState::Idle;
                if !transcript.trim().is_empty() {
                    draft.append_transcript(&transcript);
                }
                tracing::debug!(transcript_len = transcript.len(), "Voice transcript received");
                Some(Ok(transcript))
            }
            Some(Err(e)) => {
                self.state = VoiceState::Error;
                tracing::error!(error = %e, "Speech recognition error");
                Some(Err(e))
            }
            None => {
                self.state = VoiceState::Idle;
                tracing::debug!("Voice capture ended without a result");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
