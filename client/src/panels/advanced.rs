//! Advanced learning panel.
//!
//! Shares the auto-learning status endpoint but keeps its own feed, cadence
//! and guards; the two panels are not merged. Capabilities and the system
//! comparison load once on mount.

#[cfg(test)]
#[path = "advanced_test.rs"]
mod advanced_test;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;

use crate::action::{self, ActionError, ActionGuard, Notice, NoticeSlot};
use crate::fetcher::{Endpoint, Feed, PanelState};
use crate::net::types::{AutoLearningStatus, Capabilities, KnowledgeHit, SystemComparison};
use crate::net::{Shape, Transport};
use crate::scope::{Slot, ViewScope};

pub const STATUS: Endpoint = Endpoint::new("/api/auto_learning/status", Shape::Field("status"));
pub const CAPABILITIES: Endpoint = Endpoint::new("/api/advanced_learning/capabilities", Shape::Raw);
pub const COMPARISON: Endpoint = Endpoint::new("/api/learning/compare_systems", Shape::Raw);
pub const START_PATH: &str = "/api/auto_learning/start";
pub const STOP_PATH: &str = "/api/auto_learning/stop";
pub const SEARCH_PATH: &str = "/api/advanced_learning/search";
pub const SEARCH_LIMIT: usize = 10;

pub struct AdvancedLearningPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    status: Feed<AutoLearningStatus>,
    capabilities: Feed<Capabilities>,
    comparison: Feed<SystemComparison>,
    results: Slot<Vec<KnowledgeHit>>,
    notices: NoticeSlot,
    toggle_guard: ActionGuard,
    search_guard: ActionGuard,
}

impl AdvancedLearningPanel {
    pub fn mount(transport: Arc<dyn Transport>, period: Duration) -> Self {
        let panel = Self::new(transport);
        panel.status.spawn_polling(&panel.scope, period);
        let (capabilities, comparison) = (panel.capabilities.clone(), panel.comparison.clone());
        panel.scope.spawn(async move {
            let _ = capabilities.refresh().await;
            let _ = comparison.refresh().await;
        });
        panel
    }

    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        let scope = ViewScope::new();
        let status = Feed::new(Arc::clone(&transport), STATUS, &scope);
        let capabilities = Feed::new(Arc::clone(&transport), CAPABILITIES, &scope);
        let comparison = Feed::new(Arc::clone(&transport), COMPARISON, &scope);
        let results = Slot::new(Vec::new(), scope.liveness());
        let notices = Slot::new(None, scope.liveness());
        Self {
            scope,
            transport,
            status,
            capabilities,
            comparison,
            results,
            notices,
            toggle_guard: ActionGuard::new(),
            search_guard: ActionGuard::new(),
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
    pub fn capabilities(&self) -> PanelState<Capabilities> {
        self.capabilities.snapshot()
    }

    #[must_use]
    pub fn comparison(&self) -> PanelState<SystemComparison> {
        self.comparison.snapshot()
    }

    #[must_use]
    pub fn results(&self) -> Vec<KnowledgeHit> {
        self.results.get()
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notices.get()
    }

    /// Whether the running extractor is the advanced one.
    #[must_use]
    pub fn is_advanced_active(&self) -> bool {
        self.status.with_data(|s| s.is_running && s.is_advanced())
    }

    /// # Errors
    ///
    /// Fails when the switch is busy or the server rejects the request.
    pub async fn start(&self) -> Result<(), ActionError> {
        self.switch(START_PATH, "start_advanced_learning").await
    }

    /// # Errors
    ///
    /// Fails when the switch is busy or the server rejects the request.
    pub async fn stop(&self) -> Result<(), ActionError> {
        self.switch(STOP_PATH, "stop_advanced_learning").await
    }

    async fn switch(&self, path: &'static str, action: &'static str) -> Result<(), ActionError> {
        let _permit = self.toggle_guard.try_acquire()?;
        let result = super::post::<()>(self.transport.as_ref(), &self.scope.liveness(), path, None, Shape::Flag).await;
        if result.is_ok() {
            let _ = self.status.refresh().await;
        }
        action::report(&self.notices, action, result, |()| None)
    }

    /// Search extracted knowledge. A blank query is ignored.
    ///
    /// # Errors
    ///
    /// Fails when a search is pending or the request fails; earlier results
    /// are kept in that case.
    pub async fn search(&self, query: &str) -> Result<usize, ActionError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(0);
        }
        let _permit = self.search_guard.try_acquire()?;
        let result = super::post::<Vec<KnowledgeHit>>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            SEARCH_PATH,
            Some(json!({ "query": query, "limit": SEARCH_LIMIT })),
            Shape::Field("results"),
        )
        .await;
        let result = result.map(|hits| {
            let count = hits.len();
            self.results.set(hits);
            count
        });
        action::report(&self.notices, "knowledge_search", result, |_| None)
    }

    pub fn close(&self) {
        self.scope.close();
    }
}
