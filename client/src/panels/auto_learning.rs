//! Autonomous learning toggle panel.
//!
//! DESIGN
//! ======
//! Start/stop and the session triggers are reconcile-style actions: on
//! success the status feed is re-fetched and the server's answer is what the
//! panel shows. The toggle and the session triggers have separate guards so
//! a long session does not lock the on/off switch.

#[cfg(test)]
#[path = "auto_learning_test.rs"]
mod auto_learning_test;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tracing::info;

use crate::action::{self, ActionError, ActionGuard, Notice, NoticeSlot};
use crate::fetcher::{Endpoint, Feed, PanelState};
use crate::net::types::{AutoLearningStatus, SessionKind};
use crate::net::{Shape, Transport};
use crate::scope::{Slot, ViewScope};

pub const STATUS: Endpoint = Endpoint::new("/api/auto_learning/status", Shape::Field("status"));
pub const START_PATH: &str = "/api/auto_learning/start";
pub const STOP_PATH: &str = "/api/auto_learning/stop";
pub const TRIGGER_SESSION_PATH: &str = "/api/auto_learning/trigger_session";
pub const QUICK_SESSION_PATH: &str = "/api/auto_learning/quick_session";
pub const DEEP_SESSION_PATH: &str = "/api/auto_learning/deep_session";

pub struct AutoLearningPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    status: Feed<AutoLearningStatus>,
    notices: NoticeSlot,
    toggle_guard: ActionGuard,
    session_guard: ActionGuard,
}

impl AutoLearningPanel {
    /// Mount and poll the status every `period`.
    pub fn mount(transport: Arc<dyn Transport>, period: Duration) -> Self {
        let panel = Self::new(transport);
        panel.status.spawn_polling(&panel.scope, period);
        panel
    }

    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        let scope = ViewScope::new();
        let status = Feed::new(Arc::clone(&transport), STATUS, &scope);
        let notices = Slot::new(None, scope.liveness());
        Self {
            scope,
            transport,
            status,
            notices,
            toggle_guard: ActionGuard::new(),
            session_guard: ActionGuard::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> PanelState<AutoLearningStatus> {
        self.status.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PanelState<AutoLearningStatus>> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notices.get()
    }

    #[must_use]
    pub fn is_toggling(&self) -> bool {
        self.toggle_guard.is_busy()
    }

    /// Force one status refresh.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous status is kept.
    pub async fn refresh(&self) -> Result<(), crate::net::ApiError> {
        self.status.refresh().await
    }

    /// # Errors
    ///
    /// Fails when the toggle is busy or the server rejects the request.
    pub async fn start(&self) -> Result<(), ActionError> {
        self.switch(START_PATH, "start_auto_learning").await
    }

    /// # Errors
    ///
    /// Fails when the toggle is busy or the server rejects the request.
    pub async fn stop(&self) -> Result<(), ActionError> {
        self.switch(STOP_PATH, "stop_auto_learning").await
    }

    /// Start when stopped, stop when running, based on the last status.
    ///
    /// # Errors
    ///
    /// Same as [`AutoLearningPanel::start`].
    pub async fn toggle(&self) -> Result<(), ActionError> {
        if self.status.data().is_running { self.stop().await } else { self.start().await }
    }

    async fn switch(&self, path: &'static str, action: &'static str) -> Result<(), ActionError> {
        let permit = self.toggle_guard.try_acquire()?;
        let result = self.post_then_refresh(path, None).await;
        drop(permit);
        action::report(&self.notices, action, result, |()| None)
    }

    /// Run a learning session of `kind` through the generic trigger.
    ///
    /// # Errors
    ///
    /// Fails when a session is already running or the server rejects it.
    pub async fn trigger_session(&self, kind: SessionKind) -> Result<(), ActionError> {
        let _permit = self.session_guard.try_acquire()?;
        let result = self
            .post_then_refresh(TRIGGER_SESSION_PATH, Some(json!({ "type": kind.as_str() })))
            .await;
        action::report(&self.notices, "trigger_session", result, |()| {
            Some(format!("{} learning session completed", kind.as_str()))
        })
    }

    /// # Errors
    ///
    /// Fails when a session is already running or the server rejects it.
    pub async fn quick_session(&self) -> Result<(), ActionError> {
        self.dedicated_session(QUICK_SESSION_PATH, SessionKind::Quick).await
    }

    /// # Errors
    ///
    /// Fails when a session is already running or the server rejects it.
    pub async fn deep_session(&self) -> Result<(), ActionError> {
        self.dedicated_session(DEEP_SESSION_PATH, SessionKind::Deep).await
    }

    async fn dedicated_session(&self, path: &'static str, kind: SessionKind) -> Result<(), ActionError> {
        let _permit = self.session_guard.try_acquire()?;
        let result = self.post_then_refresh(path, None).await;
        action::report(&self.notices, kind.as_str(), result, |()| {
            Some(format!("{} learning session completed", kind.as_str()))
        })
    }

    async fn post_then_refresh(&self, path: &'static str, body: Option<serde_json::Value>) -> Result<(), ActionError> {
        super::post::<()>(self.transport.as_ref(), &self.scope.liveness(), path, body, Shape::Flag).await?;
        info!(path, "auto learning action accepted");
        let _ = self.status.refresh().await;
        Ok(())
    }

    pub fn dismiss_notice(&self) {
        self.notices.set(None);
    }

    pub fn close(&self) {
        self.scope.close();
    }
}
