//! Single-flight action guards and user-facing notices.
//!
//! DESIGN
//! ======
//! Each user-triggered action owns an `ActionGuard`. Acquiring it yields an
//! RAII `ActionPermit`; while a permit is alive the trigger reports busy and a
//! second attempt fails fast with `ActionError::InFlight` before any I/O. The
//! permit releases on drop, so every exit path re-enables the control.
//!
//! The permit only covers the trigger. A panel that moved its own state into
//! a pending phase arms a `Rollback` alongside it; if the future is dropped
//! before the reply is applied, the rollback returns that state to idle.

#[cfg(test)]
#[path = "action_test.rs"]
mod action_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::net::ApiError;
use crate::scope::Slot;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("action already in progress")]
    InFlight,
    #[error("view has been closed")]
    Closed,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ActionError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct ActionGuard {
    busy: Arc<AtomicBool>,
}

impl ActionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::InFlight` if a permit is already outstanding.
    pub fn try_acquire(&self) -> Result<ActionPermit, ActionError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ActionPermit { busy: Arc::clone(&self.busy) })
            .map_err(|_| ActionError::InFlight)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct ActionPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for ActionPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

// =============================================================================
// ROLLBACK
// =============================================================================

/// Undo hook for a started action. Runs on drop unless disarmed.
pub(crate) struct Rollback<F: FnOnce()> {
    undo: Option<F>,
}

impl<F: FnOnce()> Rollback<F> {
    pub(crate) fn new(undo: F) -> Self {
        Self { undo: Some(undo) }
    }

    /// The action reached its outcome; nothing to undo.
    pub(crate) fn disarm(mut self) {
        self.undo = None;
    }
}

impl<F: FnOnce()> Drop for Rollback<F> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo();
        }
    }
}

// =============================================================================
// NOTICES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient banner shown on a panel after an action completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// A panel's notice slot.
pub type NoticeSlot = Slot<Option<Notice>>;

/// Record an action outcome on `notices`: an info banner on success, an error
/// banner (and a warn log) on failure. `InFlight` and `Closed` leave the slot
/// untouched since neither is a new outcome.
pub(crate) fn report<T>(
    notices: &NoticeSlot,
    action: &'static str,
    result: Result<T, ActionError>,
    success: impl FnOnce(&T) -> Option<String>,
) -> Result<T, ActionError> {
    match &result {
        Ok(value) => {
            if let Some(message) = success(value) {
                notices.set(Some(Notice::info(message)));
            }
        }
        Err(ActionError::InFlight | ActionError::Closed) => {}
        Err(err) => {
            warn!(action, error = %err, "action failed");
            notices.set(Some(Notice::error(err.user_message())));
        }
    }
    result
}
