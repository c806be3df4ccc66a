//! Application state shared across all route handlers.
//!
//! AppState holds the chat session, the response coordinator and the voice
//! composer. It is passed to handlers via axum's State extractor.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use urlgenie_chat::{ChatSession, InputDraft, ModelClient, ResponseCoordinator, SharedSession, VoiceInput};
use urlgenie_core::config::UrlGenieConfig;

use crate::error::ApiError;

/// Voice input together with the draft it feeds.
#[derive(Debug)]
pub struct Composer {
    pub voice: VoiceInput,
    pub draft: InputDraft,
}

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
/// Mutable state is protected by `Mutex`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<UrlGenieConfig>,
    /// The single conversation served by this process.
    pub session: SharedSession,
    /// Runs send cycles against the session.
    pub coordinator: ResponseCoordinator,
    /// Voice input and the composer draft.
    pub composer: Arc<Mutex<Composer>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with a fresh session.
    pub fn new(config: UrlGenieConfig, model: Arc<dyn ModelClient>, voice: VoiceInput) -> Self {
        let session = ChatSession::new(&config.chat).into_shared();
        let coordinator = ResponseCoordinator::new(Arc::clone(&session), model, &config.chat);
        Self {
            config: Arc::new(config),
            session,
            coordinator,
            composer: Arc::new(Mutex::new(Composer {
                voice,
                draft: InputDraft::new(),
            })),
            start_time: Instant::now(),
        }
    }

    pub fn lock_composer(&self) -> Result<MutexGuard<'_, Composer>, ApiError> {
        self.composer
            .lock()
            .map_err(|e| ApiError::Internal(format!("Composer lock poisoned: {}", e)))
    }
}
