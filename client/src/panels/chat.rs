//! Chat transcript controller.
//!
//! Sending is gated on connectivity and on the transcript phase; an accepted
//! turn always ends with exactly one assistant or error message, including
//! when the caller drops the send future. Feedback is tagged locally first
//! and reported to the backend in the background.
//!
//! In futuristic mode a turn carries the current mood as emotional context.
//! The mood reads `thinking` while the reply is pending, then takes the
//! reply's emotion, or `frustrated` on failure. A reply flagged
//! `learned_something` is marked for `LEARNED_FLASH`.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::action::{ActionError, ActionGuard, Rollback};
use crate::net::envelope::adapt;
use crate::net::types::{ChatReply, FeedbackKind};
use crate::net::{ApiError, Shape, Transport};
use crate::panels::cloud::Mood;
use crate::poller::Connectivity;
use crate::scope::{Slot, ViewScope};
use crate::state::chat::{CONNECTION_ERROR_TEXT, ChatMode, ChatState};

pub const CHAT_PATH: &str = "/api/chat";
pub const FUTURISTIC_CHAT_PATH: &str = "/api/chat/futuristic";
pub const FEEDBACK_PATH: &str = "/api/feedback";
/// How long a reply that taught the backend something stays marked.
pub const LEARNED_FLASH: Duration = Duration::from_secs(3);

const THINKING: &str = "thinking";
const FRUSTRATED: &str = "frustrated";

pub struct ChatPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    connectivity: watch::Receiver<Connectivity>,
    transcript: Slot<ChatState>,
    mode: Slot<ChatMode>,
    mood: Slot<Mood>,
    learned: Slot<Option<u64>>,
    send_guard: ActionGuard,
}

impl ChatPanel {
    /// Mount with a transcript seeded by the assistant greeting. The panel
    /// starts in standard mode with a mood of its own.
    pub fn mount(transport: Arc<dyn Transport>, connectivity: watch::Receiver<Connectivity>) -> Self {
        let scope = ViewScope::new();
        let transcript = Slot::new(ChatState::with_greeting(OffsetDateTime::now_utc()), scope.liveness());
        let mode = Slot::new(ChatMode::default(), scope.liveness());
        let mood = Slot::new(Mood::default(), scope.liveness());
        let learned = Slot::new(None, scope.liveness());
        Self { scope, transport, connectivity, transcript, mode, mood, learned, send_guard: ActionGuard::new() }
    }

    /// Share `mood` instead of the panel's own, so futuristic turns move the
    /// same mood the robot face reads.
    #[must_use]
    pub fn with_mood(mut self, mood: Slot<Mood>) -> Self {
        self.mood = mood;
        self
    }

    #[must_use]
    pub fn mode(&self) -> ChatMode {
        self.mode.get()
    }

    /// Takes effect from the next send.
    pub fn set_mode(&self, mode: ChatMode) {
        self.mode.set(mode);
    }

    #[must_use]
    pub fn mood(&self) -> Mood {
        self.mood.get()
    }

    /// Id of the reply currently marked as having taught the backend.
    #[must_use]
    pub fn learned_flash(&self) -> Option<u64> {
        self.learned.get()
    }

    #[must_use]
    pub fn transcript(&self) -> ChatState {
        self.transcript.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.transcript.subscribe()
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.send_guard.is_busy()
    }

    pub fn set_input(&self, text: &str) {
        self.transcript.update(|s| {
            if s.input == text {
                return false;
            }
            text.clone_into(&mut s.input);
            true
        });
    }

    /// Send the current input as one chat turn.
    ///
    /// Returns `Ok(false)` without touching the transcript or the network when
    /// the input is blank, a reply is pending, or the backend is not connected.
    /// Dropping the future mid-request ends the turn with a cancellation
    /// message and restores the mood.
    ///
    /// # Errors
    ///
    /// `InFlight` for an overlapping send, `Closed` if the panel unmounted
    /// mid-request, and `Api` when the request failed (the transcript already
    /// carries the error message in that case).
    pub async fn send(&self) -> Result<bool, ActionError> {
        let _permit = self.send_guard.try_acquire()?;
        let connectivity = *self.connectivity.borrow();
        let mode = self.mode.get();

        let mut outgoing = None;
        self.transcript.update(|s| {
            outgoing = s.begin_send(connectivity, OffsetDateTime::now_utc());
            outgoing.is_some()
        });
        let Some(text) = outgoing else {
            debug!(%connectivity, "chat send ignored");
            return Ok(false);
        };

        let prior_mood = self.mood.get();
        let (path, body, shape) = match mode {
            ChatMode::Standard => (CHAT_PATH, json!({ "message": text }), Shape::Raw),
            ChatMode::Futuristic => {
                self.mood.set(Mood::named(THINKING));
                let body = json!({ "message": text, "emotion_context": prior_mood.emotion });
                (FUTURISTIC_CHAT_PATH, body, Shape::Flagged)
            }
        };
        let rollback = {
            let (transcript, mood) = (self.transcript.clone(), self.mood.clone());
            let restore = (mode == ChatMode::Futuristic).then(|| prior_mood.clone());
            Rollback::new(move || {
                if transcript.update(|s| s.cancel(OffsetDateTime::now_utc())) {
                    debug!("chat turn cancelled");
                }
                if let Some(prior) = restore {
                    mood.set(prior);
                }
            })
        };

        let reply = self.transport.post_json(path, Some(body)).await;
        if !self.scope.is_open() {
            return Err(ActionError::Closed);
        }
        rollback.disarm();

        match reply.and_then(|body| adapt::<ChatReply>(shape, path, body)) {
            Ok(reply) => {
                if mode == ChatMode::Futuristic {
                    self.mood.set(reply.emotion.as_deref().map_or(prior_mood, Mood::named));
                }
                let learned = reply.learned_something;
                let mut appended = None;
                self.transcript.update(|s| {
                    appended = s.finish_success(reply, OffsetDateTime::now_utc());
                    true
                });
                if let Some(id) = appended.filter(|_| learned) {
                    self.flash_learned(id);
                }
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, ?mode, "chat turn failed");
                if mode == ChatMode::Futuristic {
                    self.mood.set(Mood::named(FRUSTRATED));
                }
                let text = match &e {
                    ApiError::Network { .. } | ApiError::ClientBuild(_) => CONNECTION_ERROR_TEXT.to_owned(),
                    other => other.user_message(),
                };
                self.transcript.update(|s| {
                    s.finish_failure(&text, OffsetDateTime::now_utc());
                    true
                });
                Err(ActionError::Api(e))
            }
        }
    }

    fn flash_learned(&self, id: u64) {
        info!(message_id = id, "reply taught the backend something");
        self.learned.set(Some(id));
        let learned = self.learned.clone();
        self.scope.spawn(async move {
            tokio::time::sleep(LEARNED_FLASH).await;
            learned.update(|current| {
                if *current != Some(id) {
                    return false;
                }
                *current = None;
                true
            });
        });
    }

    /// Tag an assistant message and report it. Returns `false` when `id` is
    /// not an assistant message. The report is best effort: a failed POST is
    /// logged and the tag stays.
    pub fn feedback(&self, id: u64, kind: FeedbackKind) -> bool {
        if !self.transcript.update(|s| s.tag_feedback(id, kind)) {
            return false;
        }
        let transport = Arc::clone(&self.transport);
        self.scope.spawn(async move {
            if let Err(e) = report_feedback(transport.as_ref(), id, kind).await {
                warn!(message_id = id, error = %e, "feedback report failed");
            }
        });
        true
    }

    /// Tag an assistant message and wait for the backend to record it.
    ///
    /// # Errors
    ///
    /// `Rejected` when `id` is not an assistant message, `Api` when the
    /// report failed. The local tag is kept either way.
    pub async fn submit_feedback(&self, id: u64, kind: FeedbackKind) -> Result<(), ActionError> {
        if !self.transcript.update(|s| s.tag_feedback(id, kind)) {
            return Err(ActionError::Rejected("only assistant replies can be rated".to_owned()));
        }
        report_feedback(self.transport.as_ref(), id, kind).await?;
        Ok(())
    }

    pub fn clear(&self) {
        self.transcript.update(|s| {
            s.clear();
            true
        });
    }

    pub fn close(&self) {
        self.scope.close();
    }
}

async fn report_feedback(transport: &dyn Transport, id: u64, kind: FeedbackKind) -> Result<(), ApiError> {
    let body = json!({ "message_id": id, "feedback": kind, "rating": kind.rating() });
    transport.post_json(FEEDBACK_PATH, Some(body)).await?;
    info!(message_id = id, ?kind, "feedback recorded");
    Ok(())
}
