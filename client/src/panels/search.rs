//! Web search panel.

#[cfg(test)]
#[path = "search_test.rs"]
mod search_test;

use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;
use tracing::info;

use crate::action::{self, ActionError, ActionGuard, Notice, NoticeSlot, Rollback};
use crate::net::types::WebSearchReply;
use crate::net::{Shape, Transport};
use crate::scope::{Slot, ViewScope};
use crate::state::search::{SearchResult, SearchState};

pub const SEARCH_PATH: &str = "/api/buscar_web";

pub struct SearchPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    state: Slot<SearchState>,
    notices: NoticeSlot,
    guard: ActionGuard,
}

impl SearchPanel {
    pub fn mount(transport: Arc<dyn Transport>) -> Self {
        let scope = ViewScope::new();
        let state = Slot::new(SearchState::default(), scope.liveness());
        let notices = Slot::new(None, scope.liveness());
        Self { scope, transport, state, notices, guard: ActionGuard::new() }
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notices.get()
    }

    pub fn set_query(&self, query: &str) {
        self.state.update(|s| {
            if s.query == query {
                return false;
            }
            query.clone_into(&mut s.query);
            true
        });
    }

    /// Search for the current query. Returns `Ok(false)` for a blank query.
    /// Dropping the future mid-request clears `searching` and keeps the
    /// previous results.
    ///
    /// # Errors
    ///
    /// Any failure clears the result list and sets an error notice.
    pub async fn search(&self) -> Result<bool, ActionError> {
        let _permit = self.guard.try_acquire()?;
        let mut started = None;
        self.state.update(|s| {
            started = s.begin();
            started.is_some()
        });
        let Some(query) = started else {
            return Ok(false);
        };
        let state = self.state.clone();
        let rollback = Rollback::new(move || {
            state.update(SearchState::cancel);
        });

        let result = super::post::<WebSearchReply>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            SEARCH_PATH,
            Some(json!({ "query": query })),
            Shape::Flagged,
        )
        .await;
        rollback.disarm();

        match &result {
            Ok(reply) => {
                info!(%query, hits = reply.resultados.len(), "web search completed");
                let hits = reply.resultados.clone();
                self.state.update(|s| {
                    s.finish_success(&query, hits);
                    true
                });
            }
            Err(_) => {
                self.state.update(|s| {
                    s.finish_failure();
                    true
                });
            }
        }
        action::report(&self.notices, "web_search", result.map(|_| true), |_| None)
    }

    /// Re-run a query from the recent list.
    ///
    /// # Errors
    ///
    /// Same as [`SearchPanel::search`].
    pub async fn search_recent(&self, query: &str) -> Result<bool, ActionError> {
        self.set_query(query);
        self.search().await
    }

    /// Returns whether `result` is bookmarked after the toggle.
    pub fn toggle_bookmark(&self, result: &SearchResult) -> bool {
        let mut bookmarked = false;
        self.state.update(|s| {
            bookmarked = s.toggle_bookmark(result);
            true
        });
        bookmarked
    }

    pub fn dismiss_notice(&self) {
        self.notices.set(None);
    }

    pub fn close(&self) {
        self.scope.close();
    }
}
