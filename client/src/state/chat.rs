#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use time::OffsetDateTime;

use crate::net::types::{ChatReply, FeedbackKind, LearningSnapshot};
use crate::poller::Connectivity;

pub const GREETING: &str = "Hello! I'm ARIA. Ask me anything, or teach me something new.";
pub const CONNECTION_ERROR_TEXT: &str = "Connection error. Check that the ARIA server is running.";
pub const CANCELLED_TEXT: &str = "Request cancelled before a reply arrived.";

/// Which chat endpoint a turn goes to. `Futuristic` sends the current mood
/// as emotional context and reads an emotion back from the reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChatMode {
    #[default]
    Standard,
    Futuristic,
}

impl ChatMode {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "standard" | "classic" => Some(Self::Standard),
            "futuristic" => Some(Self::Futuristic),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChatPhase {
    #[default]
    Idle,
    AwaitingResponse,
}

/// A single transcript entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub text: String,
    pub timestamp: OffsetDateTime,
    pub confidence: Option<f64>,
    pub learning_stats: Option<LearningSnapshot>,
    pub feedback: Option<FeedbackKind>,
    /// Emotion the backend attached to a futuristic reply.
    pub emotion: Option<String>,
    pub learned_something: bool,
}

impl Message {
    /// Confidence as a whole percentage, e.g. `0.9` renders as `90`.
    #[must_use]
    pub fn confidence_percent(&self) -> Option<u32> {
        self.confidence.map(confidence_percent)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Transcript plus the composer input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub input: String,
    pub phase: ChatPhase,
    next_id: u64,
}

impl ChatState {
    /// A transcript seeded with the assistant greeting.
    #[must_use]
    pub fn with_greeting(now: OffsetDateTime) -> Self {
        let mut state = Self::default();
        state.push(Role::Assistant, GREETING.to_owned(), now);
        state
    }

    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        self.phase == ChatPhase::AwaitingResponse
    }

    /// Try to start a turn. Accepted only when the trimmed input is non-empty,
    /// no reply is pending, and the backend is reachable. On acceptance the
    /// user message is appended, the input is cleared, and the text to send
    /// is returned.
    pub fn begin_send(&mut self, connectivity: Connectivity, now: OffsetDateTime) -> Option<String> {
        let text = self.input.trim();
        if text.is_empty() || self.is_awaiting() || connectivity != Connectivity::Connected {
            return None;
        }
        let text = text.to_owned();
        self.push(Role::User, text.clone(), now);
        self.input.clear();
        self.phase = ChatPhase::AwaitingResponse;
        Some(text)
    }

    /// Append the assistant reply and return its id. A reply without text
    /// becomes a connection error message instead and returns `None`.
    pub fn finish_success(&mut self, reply: ChatReply, now: OffsetDateTime) -> Option<u64> {
        let Some(text) = reply.response else {
            self.finish_failure(CONNECTION_ERROR_TEXT, now);
            return None;
        };
        let id = self.push(Role::Assistant, text, now);
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.confidence = reply.confidence;
            message.learning_stats = reply.learning_stats;
            message.emotion = reply.emotion;
            message.learned_something = reply.learned_something;
        }
        self.phase = ChatPhase::Idle;
        Some(id)
    }

    pub fn finish_failure(&mut self, text: &str, now: OffsetDateTime) {
        self.push(Role::Error, text.to_owned(), now);
        self.phase = ChatPhase::Idle;
    }

    /// End a pending turn that will never get its reply. Returns `false` when
    /// nothing was pending.
    pub fn cancel(&mut self, now: OffsetDateTime) -> bool {
        if !self.is_awaiting() {
            return false;
        }
        self.finish_failure(CANCELLED_TEXT, now);
        true
    }

    /// Tag an assistant message. Returns `false` for unknown ids and for
    /// messages that are not assistant replies.
    pub fn tag_feedback(&mut self, id: u64, kind: FeedbackKind) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.role == Role::Assistant => {
                message.feedback = Some(kind);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.messages = Vec::new();
    }

    fn push(&mut self, role: Role, text: String, now: OffsetDateTime) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.messages.push(Message {
            id,
            role,
            text,
            timestamp: now,
            confidence: None,
            learning_stats: None,
            feedback: None,
            emotion: None,
            learned_something: false,
        });
        id
    }
}
