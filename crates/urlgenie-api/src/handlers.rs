//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its JSON body via axum extractors, drives the chat
//! session through AppState, and returns JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use urlgenie_chat::session::lock_session;
use urlgenie_chat::{IgnoreReason, SendOutcome, SessionSnapshot, VoiceState};
use urlgenie_core::types::Message;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SetContextRequest {
    pub url: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub message_count: u64,
    pub pending: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// One of "ignored", "needs_context", "answered", "failed".
    pub outcome: &'static str,
    /// The bot message appended by this send, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// True when the client should prompt the user for a URL.
    pub prompt_context: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SendOutcome> for SendMessageResponse {
    fn from(outcome: SendOutcome) -> Self {
        let message = outcome.reply().cloned();
        match outcome {
            SendOutcome::Ignored(_) => Self {
                outcome: "ignored",
                message,
                prompt_context: false,
                error: None,
            },
            SendOutcome::NeedsContext { .. } => Self {
                outcome: "needs_context",
                message,
                prompt_context: true,
                error: None,
            },
            SendOutcome::Answered(_) => Self {
                outcome: "answered",
                message,
                prompt_context: false,
                error: None,
            },
            SendOutcome::Failed { error, .. } => Self {
                outcome: "failed",
                message,
                prompt_context: false,
                error: Some(error.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub active_url: Option<String>,
    pub notice: Message,
}

#[derive(Debug, Serialize)]
pub struct VoiceStatusResponse {
    pub state: VoiceState,
    pub available: bool,
    pub draft: String,
    /// Set when the listen resolved with a recognition error on this poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoiceToggleResponse {
    pub state: VoiceState,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let session = lock_session(&state.session)?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        message_count: session.transcript().len() as u64,
        pending: session.is_pending(),
    }))
}

/// GET /session - transcript, active URL and pending flag.
pub async fn get_session(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = lock_session(&state.session)?;
    Ok(Json(session.snapshot()))
}

/// POST /messages - send user text through the coordinator.
///
/// A send while another is in flight is a 409; empty text is accepted and
/// reported as `ignored`. The cycle runs on its own task and completes even
/// when the client disconnects.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let Json(req) = payload?;

    let coordinator = state.coordinator.clone();
    let outcome = tokio::spawn(async move { coordinator.send(&req.text).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Send task failed: {}", e)))??;
    if outcome == SendOutcome::Ignored(IgnoreReason::Busy) {
        return Err(ApiError::Conflict(
            "A response is still being generated".to_string(),
        ));
    }

    Ok(Json(SendMessageResponse::from(outcome)))
}

/// PUT /context - set the target URL.
pub async fn set_context(
    State(state): State<AppState>,
    payload: Result<Json<SetContextRequest>, JsonRejection>,
) -> Result<Json<ContextResponse>, ApiError> {
    let Json(req) = payload?;

    let mut session = lock_session(&state.session)?;
    let notice = session.set_url(&req.url)?;
    Ok(Json(ContextResponse {
        active_url: session.active_url().map(str::to_owned),
        notice,
    }))
}

/// DELETE /context - clear the target URL.
pub async fn clear_context(State(state): State<AppState>) -> Result<Json<ContextResponse>, ApiError> {
    let mut session = lock_session(&state.session)?;
    let notice = session.clear_url()?;
    Ok(Json(ContextResponse {
        active_url: None,
        notice,
    }))
}

/// GET /voice - poll the recognizer and report state and draft.
pub async fn voice_status(State(state): State<AppState>) -> Result<Json<VoiceStatusResponse>, ApiError> {
    let mut guard = state.lock_composer()?;
    let composer = &mut *guard;
    let error = match composer.voice.poll(&mut composer.draft) {
        Some(Err(e)) => Some(e.to_string()),
        _ => None,
    };

    Ok(Json(VoiceStatusResponse {
        state: composer.voice.state(),
        available: composer.voice.is_available(),
        draft: composer.draft.as_str().to_string(),
        error,
    }))
}

/// POST /voice/toggle - start or stop listening.
pub async fn toggle_voice(State(state): State<AppState>) -> Result<Json<VoiceToggleResponse>, ApiError> {
    let mut composer = state.lock_composer()?;
    let voice_state = composer.voice.toggle()?;
    Ok(Json(VoiceToggleResponse { state: voice_state }))
}

/// DELETE /voice/draft - take the draft, leaving it empty.
pub async fn take_draft(State(state): State<AppState>) -> Result<Json<DraftResponse>, ApiError> {
    let mut composer = state.lock_composer()?;
    Ok(Json(DraftResponse {
        draft: composer.draft.take(),
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("No such endpoint".to_string())
}
