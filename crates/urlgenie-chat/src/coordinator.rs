//! Response coordinator: one request/response cycle per `send`.
//!
//! Validates the input, applies the single-flight guard, forwards a bounded
//! history to the model collaborator and appends the reply to the transcript.
//! Per attempt the coordinator moves `Idle -> Pending -> {Answered |
//! NeedsContext | Failed}` and always ends back in `Idle`.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError};

use urlgenie_core::config::ChatConfig;
use urlgenie_core::types::{Message, SourceCitation};

use crate::error::{ChatError, ModelError};
use crate::model::{history_turns, ModelClient, ModelRequest};
use crate::session::{lock_session, ChatSession, SharedSession};

/// Reply appended when a send is attempted with no context URL.
pub const GUIDANCE_MESSAGE: &str =
    "Please set a target URL in the sidebar first so I know what to talk about!";

/// Reply used when the model returns no text.
pub const FALLBACK_REPLY: &str = "I couldn't generate a response. Please try again.";

/// Reply appended on model failure when `reply_on_failure` is enabled.
pub const FAILURE_REPLY: &str = "Sorry, I encountered an error while processing your request. Please ensure your API key is valid and try again.";

/// Why a send was dropped without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Empty or whitespace-only text.
    Empty,
    /// Another request is still in flight.
    Busy,
}

/// Result of a single `send` attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Nothing was appended.
    Ignored(IgnoreReason),
    /// No context URL: the user message and a guidance reply were appended.
    /// The presentation layer should prompt for a URL.
    NeedsContext { guidance: Message },
    /// The model answered; the bot message was appended.
    Answered(Message),
    /// The model failed. `reply` is the apology appended when configured.
    Failed {
        error: ModelError,
        reply: Option<Message>,
    },
}

impl SendOutcome {
    /// The bot message appended by this attempt, if any.
    pub fn reply(&self) -> Option<&Message> {
        match self {
            SendOutcome::Ignored(_) => None,
            SendOutcome::NeedsContext { guidance } => Some(guidance),
            SendOutcome::Answered(message) => Some(message),
            SendOutcome::Failed { reply, .. } => reply.as_ref(),
        }
    }
}

/// Raises the pending flag on creation and lowers it on drop, so every exit
/// path of a send (including cancellation of the awaiting task) releases it.
struct PendingGuard {
    session: SharedSession,
}

impl PendingGuard {
    fn raise(session: &SharedSession, locked: &mut ChatSession) -> Self {
        locked.set_pending(true);
        Self {
            session: Arc::clone(session),
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        session.set_pending(false);
    }
}

/// Coordinates sends against a shared session and a model collaborator.
#[derive(Clone)]
pub struct ResponseCoordinator {
    session: SharedSession,
    model: Arc<dyn ModelClient>,
    history_limit: usize,
    reply_on_failure: bool,
}

impl ResponseCoordinator {
    /// Create a coordinator using `config` for history size and failure policy.
    pub fn new(session: SharedSession, model: Arc<dyn ModelClient>, config: &ChatConfig) -> Self {
        Self {
            session,
            model,
            history_limit: config.effective_history_limit(),
            reply_on_failure: config.reply_on_failure,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Send one user message and reconcile the reply into the transcript.
    ///
    /// Empty text and sends while another request is pending are no-ops.
    /// Model failures are contained here and reported as
    /// [`SendOutcome::Failed`]; only session poisoning surfaces as an error.
    pub async fn send(&self, text: &str) -> Result<SendOutcome, ChatError> {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring empty message");
            return Ok(SendOutcome::Ignored(IgnoreReason::Empty));
        }

        let (request, _pending) = {
            let mut session = lock_session(&self.session)?;
            if session.is_pending() {
                tracing::debug!("Ignoring message while a request is pending");
                return Ok(SendOutcome::Ignored(IgnoreReason::Busy));
            }

            let Some(url) = session.active_url().map(str::to_owned) else {
                session.append(Message::user(text))?;
                let guidance = Message::bot(GUIDANCE_MESSAGE);
                session.append(guidance.clone())?;
                tracing::info!("Message sent without context URL; guidance appended");
                return Ok(SendOutcome::NeedsContext { guidance });
            };

            let history = history_turns(session.transcript().recent(self.history_limit));
            session.append(Message::user(text))?;
            let pending = PendingGuard::raise(&self.session, &mut session);

            let request = ModelRequest {
                history,
                message: text.to_string(),
                target_url: Some(url),
            };
            (request, pending)
        };

        tracing::info!(
            url = request.target_url.as_deref().unwrap_or_default(),
            history_len = request.history.len(),
            "Requesting model reply"
        );

        match self.model.generate(request).await {
            Ok(reply) => {
                let text = reply
                    .text
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                let message = Message::bot(text).with_sources(dedup_sources(reply.sources));

                let mut session = lock_session(&self.session)?;
                session.append(message.clone())?;
                tracing::info!(
                    sources = message.sources.as_ref().map_or(0, Vec::len),
                    "Model reply appended"
                );
                Ok(SendOutcome::Answered(message))
            }
            Err(error) => {
                tracing::error!(error = %error, "Error sending message");
                let reply = if self.reply_on_failure {
                    let message = Message::bot(FAILURE_REPLY);
                    lock_session(&self.session)?.append(message.clone())?;
                    Some(message)
                } else {
                    None
                };
                Ok(SendOutcome::Failed { error, reply })
            }
        }
    }
}

/// Remove citations with a repeated URI, keeping first-seen order.
pub fn dedup_sources(sources: Vec<SourceCitation>) -> Vec<SourceCitation> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.uri.clone()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::{oneshot, Notify};
    use urlgenie_core::types::Sender;

    use crate::model::{HistoryRole, ModelReply};
    use crate::session::ChatSession;

    /// Model returning a canned result and recording every request.
    struct MockModel {
        calls: AtomicUsize,
        requests: Mutex<Vec<ModelRequest>>,
        result: Result<ModelReply, ModelError>,
    }

    impl MockModel {
        fn replying(reply: ModelReply) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                result: Ok(reply),
            })
        }

        fn failing(error: ModelError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                result: Err(error),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> ModelRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ModelClient for MockModel {
        async fn generate(&self, request: ModelRequest) -> Result<ModelReply, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            self.result.clone()
        }
    }

    /// Model that blocks until the test releases it.
    struct GatedModel {
        entered: Notify,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl GatedModel {
        fn new() -> (Arc<Self>, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            let model = Arc::new(Self {
                entered: Notify::new(),
                gate: Mutex::new(Some(rx)),
            });
            (model, tx)
        }
    }

    #[async_trait]
    impl ModelClient for GatedModel {
        async fn generate(&self, _request: ModelRequest) -> Result<ModelReply, ModelError> {
            self.entered.notify_one();
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(ModelReply::text("released"))
        }
    }

    fn coordinator_with(model: Arc<dyn ModelClient>, config: ChatConfig) -> ResponseCoordinator {
        let session = ChatSession::new(&config).into_shared();
        ResponseCoordinator::new(session, model, &config)
    }

    fn coordinator(model: Arc<dyn ModelClient>) -> ResponseCoordinator {
        coordinator_with(model, ChatConfig::default())
    }

    fn set_url(coord: &ResponseCoordinator, url: &str) {
        coord.session().lock().unwrap().set_url(url).unwrap();
    }

    fn transcript_len(coord: &ResponseCoordinator) -> usize {
        coord.session().lock().unwrap().transcript().len()
    }

    fn is_pending(coord: &ResponseCoordinator) -> bool {
        coord.session().lock().unwrap().is_pending()
    }

    // ---- Empty input ----

    #[tokio::test]
    async fn test_empty_and_whitespace_sends_are_noops() {
        let model = MockModel::replying(ModelReply::text("unused"));
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");
        let before = transcript_len(&coord);

        for text in ["", "   ", "\n\t"] {
            let outcome = coord.send(text).await.unwrap();
            assert_eq!(outcome, SendOutcome::Ignored(IgnoreReason::Empty));
        }

        assert_eq!(transcript_len(&coord), before);
        assert!(!is_pending(&coord));
        assert_eq!(model.calls(), 0);
    }

    // ---- No context ----

    #[tokio::test]
    async fn test_send_without_url_appends_guidance_without_model_call() {
        let model = MockModel::replying(ModelReply::text("unused"));
        let coord = coordinator(model.clone());
        let before = transcript_len(&coord);

        let outcome = coord.send("hello").await.unwrap();

        let guidance = match outcome {
            SendOutcome::NeedsContext { guidance } => guidance,
            other => panic!("expected NeedsContext, got {:?}", other),
        };
        assert_eq!(guidance.text, GUIDANCE_MESSAGE);
        assert_eq!(model.calls(), 0);
        assert!(!is_pending(&coord));

        let session = coord.session().lock().unwrap();
        let messages = session.transcript().messages();
        assert_eq!(messages.len(), before + 2);
        assert_eq!(messages[before].sender, Sender::User);
        assert_eq!(messages[before].text, "hello");
        assert_eq!(messages[before + 1].sender, Sender::Bot);
        assert_eq!(messages[before + 1].id, guidance.id);
    }

    // ---- Success ----

    #[tokio::test]
    async fn test_successful_send_appends_user_then_bot() {
        let model = MockModel::replying(ModelReply::text("Answer"));
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");
        let before = transcript_len(&coord);

        let outcome = coord.send("what's new?").await.unwrap();

        let reply = match outcome {
            SendOutcome::Answered(m) => m,
            other => panic!("expected Answered, got {:?}", other),
        };
        assert_eq!(reply.text, "Answer");
        assert!(reply.sources.is_none());
        assert_eq!(model.calls(), 1);
        assert!(!is_pending(&coord));

        let session = coord.session().lock().unwrap();
        let messages = session.transcript().messages();
        assert_eq!(messages.len(), before + 2);
        assert_eq!(messages[before].text, "what's new?");
        assert_eq!(messages[before + 1].text, "Answer");
    }

    #[tokio::test]
    async fn test_request_carries_url_message_and_prior_history() {
        let model = MockModel::replying(ModelReply::text("ok"));
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");

        coord.send("first question").await.unwrap();
        let request = model.last_request();

        assert_eq!(request.message, "first question");
        assert_eq!(request.target_url.as_deref(), Some("https://example.com"));
        // Welcome + context notice; the new user message is not part of history.
        assert_eq!(request.history.len(), 2);
        assert!(request.history.iter().all(|t| t.role == HistoryRole::Model));
        assert!(request.history[1].text.contains("https://example.com"));
    }

    #[tokio::test]
    async fn test_sources_deduplicated_by_uri() {
        let reply = ModelReply::text("Answer").with_sources(vec![
            SourceCitation::new("A", "u1"),
            SourceCitation::new("A2", "u1"),
        ]);
        let coord = coordinator(MockModel::replying(reply));
        set_url(&coord, "https://example.com");

        let outcome = coord.send("what's new?").await.unwrap();
        let message = outcome.reply().cloned().unwrap();
        let sources = message.sources.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "A");
        assert_eq!(sources[0].uri, "u1");
    }

    #[tokio::test]
    async fn test_empty_sources_stored_as_none() {
        let reply = ModelReply::text("Answer").with_sources(vec![]);
        let coord = coordinator(MockModel::replying(reply));
        set_url(&coord, "https://example.com");

        let outcome = coord.send("q").await.unwrap();
        assert!(outcome.reply().unwrap().sources.is_none());
    }

    #[tokio::test]
    async fn test_absent_or_blank_text_uses_fallback() {
        for text in [None, Some("   ".to_string())] {
            let reply = ModelReply {
                text,
                sources: vec![],
            };
            let coord = coordinator(MockModel::replying(reply));
            set_url(&coord, "https://example.com");

            let outcome = coord.send("q").await.unwrap();
            assert_eq!(outcome.reply().unwrap().text, FALLBACK_REPLY);
        }
    }

    // ---- Failure ----

    #[tokio::test]
    async fn test_failure_appends_nothing_by_default() {
        let model = MockModel::failing(ModelError::Transport("timeout".to_string()));
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");
        let before = transcript_len(&coord);

        let outcome = coord.send("q").await.unwrap();

        match outcome {
            SendOutcome::Failed { error, reply } => {
                assert_eq!(error, ModelError::Transport("timeout".to_string()));
                assert!(reply.is_none());
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        // Only the user message was appended.
        assert_eq!(transcript_len(&coord), before + 1);
        assert!(!is_pending(&coord));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_reply_when_enabled() {
        let config = ChatConfig {
            reply_on_failure: true,
            ..ChatConfig::default()
        };
        let model = MockModel::failing(ModelError::MissingApiKey);
        let coord = coordinator_with(model, config);
        set_url(&coord, "https://example.com");
        let before = transcript_len(&coord);

        let outcome = coord.send("q").await.unwrap();

        let reply = outcome.reply().cloned().unwrap();
        assert_eq!(reply.text, FAILURE_REPLY);
        assert_eq!(transcript_len(&coord), before + 2);
        assert!(!is_pending(&coord));
    }

    #[tokio::test]
    async fn test_failure_does_not_block_next_send() {
        let model = MockModel::failing(ModelError::Status {
            status: 500,
            body: "oops".to_string(),
        });
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");

        coord.send("one").await.unwrap();
        coord.send("two").await.unwrap();
        assert_eq!(model.calls(), 2);
    }

    // ---- Single-flight guard ----

    #[tokio::test]
    async fn test_send_while_pending_is_noop() {
        let (model, release) = GatedModel::new();
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");

        let first = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.send("first").await })
        };
        model.entered.notified().await;
        assert!(is_pending(&coord));
        let during = transcript_len(&coord);

        let outcome = coord.send("second").await.unwrap();
        assert_eq!(outcome, SendOutcome::Ignored(IgnoreReason::Busy));
        assert_eq!(transcript_len(&coord), during);
        assert!(is_pending(&coord));

        release.send(()).unwrap();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.reply().unwrap().text, "released");
        assert!(!is_pending(&coord));
    }

    #[tokio::test]
    async fn test_context_changes_allowed_while_pending() {
        let (model, release) = GatedModel::new();
        let coord = coordinator(model.clone());
        set_url(&coord, "https://a.com");

        let first = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.send("q").await })
        };
        model.entered.notified().await;

        set_url(&coord, "https://b.com");
        assert!(is_pending(&coord));

        release.send(()).unwrap();
        first.await.unwrap().unwrap();

        let session = coord.session().lock().unwrap();
        assert_eq!(session.active_url(), Some("https://b.com"));
        assert_eq!(session.transcript().last().unwrap().text, "released");
    }

    #[tokio::test]
    async fn test_cancelled_send_releases_pending() {
        let (model, _release) = GatedModel::new();
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");

        let task = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.send("q").await })
        };
        model.entered.notified().await;
        assert!(is_pending(&coord));

        task.abort();
        let _ = task.await;
        assert!(!is_pending(&coord));
    }

    // ---- History bound ----

    #[tokio::test]
    async fn test_history_never_exceeds_limit_after_many_turns() {
        let model = MockModel::replying(ModelReply::text("a"));
        let coord = coordinator(model.clone());
        set_url(&coord, "https://example.com");

        for i in 0..50 {
            coord.send(&format!("turn {}", i)).await.unwrap();
            assert!(model.last_request().history.len() <= 10);
        }

        let request = model.last_request();
        assert_eq!(request.history.len(), 10);
        // Most recent ten, oldest first: the turn-48 answer is last.
        assert_eq!(request.history[9].role, HistoryRole::Model);
        assert_eq!(request.history[8].text, "turn 48");
        assert_eq!(request.message, "turn 49");
    }

    #[tokio::test]
    async fn test_configured_history_limit() {
        let config = ChatConfig {
            history_limit: 3,
            ..ChatConfig::default()
        };
        let model = MockModel::replying(ModelReply::text("a"));
        let coord = coordinator_with(model.clone(), config);
        set_url(&coord, "https://example.com");

        for i in 0..5 {
            coord.send(&format!("turn {}", i)).await.unwrap();
        }
        assert_eq!(model.last_request().history.len(), 3);
    }

    // ---- Transcript ordering ----

    #[tokio::test]
    async fn test_mixed_operations_are_append_only_fifo() {
        let model = MockModel::replying(ModelReply::text("bot"));
        let coord = coordinator(model);

        let mut lengths = vec![transcript_len(&coord)];
        coord.send("no url yet").await.unwrap();
        lengths.push(transcript_len(&coord));
        set_url(&coord, "https://a.com");
        lengths.push(transcript_len(&coord));
        coord.send("question").await.unwrap();
        lengths.push(transcript_len(&coord));
        coord.session().lock().unwrap().clear_url().unwrap();
        lengths.push(transcript_len(&coord));
        coord.send("").await.unwrap();
        lengths.push(transcript_len(&coord));

        assert!(lengths.windows(2).all(|w| w[0] <= w[1]));

        let session = coord.session().lock().unwrap();
        let texts: Vec<&str> = session
            .transcript()
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts[1], "no url yet");
        assert_eq!(texts[2], GUIDANCE_MESSAGE);
        assert!(texts[3].starts_with("Context set to: https://a.com"));
        assert_eq!(texts[4], "question");
        assert_eq!(texts[5], "bot");
        assert_eq!(texts[6], crate::context::CLEARED_NOTICE);
        assert_eq!(texts.len(), 7);
    }

    // ---- dedup_sources ----

    #[test]
    fn test_dedup_sources_keeps_first_seen_order() {
        let sources = vec![
            SourceCitation::new("B", "u2"),
            SourceCitation::new("A", "u1"),
            SourceCitation::new("B again", "u2"),
            SourceCitation::new("C", "u3"),
        ];
        let deduped = dedup_sources(sources);
        let uris: Vec<&str> = deduped.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["u2", "u1", "u3"]);
        assert_eq!(deduped[0].title, "B");
    }

    #[test]
    fn test_dedup_sources_empty() {
        assert!(dedup_sources(vec![]).is_empty());
    }
}
