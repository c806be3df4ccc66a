//! Conversational state for UrlGenie.
//!
//! Holds the append-only transcript, the active context URL and the
//! single-flight request flag, and reconciles grounded model replies back
//! into the transcript.

pub mod context;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod voice;

pub use context::ContextManager;
pub use coordinator::{IgnoreReason, ResponseCoordinator, SendOutcome};
pub use error::{ChatError, ModelError, VoiceError};
pub use model::{HistoryRole, HistoryTurn, ModelClient, ModelReply, ModelRequest};
pub use session::{ChatSession, SessionSnapshot, SharedSession};
pub use store::MessageStore;
pub use voice::{InputDraft, SpeechRecognizer, VoiceInput, VoiceState, VoiceSubscription};
