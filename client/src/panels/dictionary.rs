//! Dictionary learning panel.
//!
//! Stats are polled; search, lookup and learn are user-driven. The learning
//! switch reconciles by re-fetching stats, like the auto-learning toggle.

#[cfg(test)]
#[path = "dictionary_test.rs"]
mod dictionary_test;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tracing::info;

use crate::action::{self, ActionError, ActionGuard, Notice, NoticeSlot};
use crate::fetcher::{Endpoint, Feed, PanelState};
use crate::net::api::encode_component;
use crate::net::types::{DictionaryStats, WordEntry, WordSummary};
use crate::net::{Shape, Transport};
use crate::scope::{Slot, ViewScope};

pub const STATS: Endpoint = Endpoint::new("/api/dictionary/stats", Shape::Field("stats"));
pub const START_PATH: &str = "/api/dictionary/start-learning";
pub const STOP_PATH: &str = "/api/dictionary/stop-learning";
pub const LEARN_WORD_PATH: &str = "/api/dictionary/learn-word";
pub const SEARCH_LIMIT: usize = 10;

const WORD_NOT_FOUND: &str = "word not found";

#[must_use]
pub fn search_path(query: &str) -> String {
    format!("/api/dictionary/search?q={}&limit={SEARCH_LIMIT}", encode_component(query))
}

#[must_use]
pub fn word_path(word: &str) -> String {
    format!("/api/dictionary/word/{}", encode_component(word))
}

/// Search hits and the word currently open in the detail view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lookup {
    pub results: Vec<WordSummary>,
    pub selected: Option<WordEntry>,
}

pub struct DictionaryPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    stats: Feed<DictionaryStats>,
    lookup: Slot<Lookup>,
    notices: NoticeSlot,
    toggle_guard: ActionGuard,
    learn_guard: ActionGuard,
}

impl DictionaryPanel {
    pub fn mount(transport: Arc<dyn Transport>, period: Duration) -> Self {
        let panel = Self::new(transport);
        panel.stats.spawn_polling(&panel.scope, period);
        panel
    }

    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        let scope = ViewScope::new();
        let stats = Feed::new(Arc::clone(&transport), STATS, &scope);
        let lookup = Slot::new(Lookup::default(), scope.liveness());
        let notices = Slot::new(None, scope.liveness());
        Self {
            scope,
            transport,
            stats,
            lookup,
            notices,
            toggle_guard: ActionGuard::new(),
            learn_guard: ActionGuard::new(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> PanelState<DictionaryStats> {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PanelState<DictionaryStats>> {
        self.stats.subscribe()
    }

    #[must_use]
    pub fn lookup(&self) -> Lookup {
        self.lookup.get()
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notices.get()
    }

    /// # Errors
    ///
    /// Returns the fetch error; previous stats are kept.
    pub async fn refresh(&self) -> Result<(), crate::net::ApiError> {
        self.stats.refresh().await
    }

    /// Flip automatic dictionary learning based on the last known stats.
    ///
    /// # Errors
    ///
    /// Fails when the switch is busy or the server rejects the request.
    pub async fn toggle_learning(&self) -> Result<(), ActionError> {
        let _permit = self.toggle_guard.try_acquire()?;
        let path = if self.stats.data().learning_enabled { STOP_PATH } else { START_PATH };
        let result = super::post::<()>(self.transport.as_ref(), &self.scope.liveness(), path, None, Shape::Flag).await;
        if result.is_ok() {
            info!(path, "dictionary learning switched");
            let _ = self.stats.refresh().await;
        }
        action::report(&self.notices, "toggle_dictionary_learning", result, |()| None)
    }

    /// Search words. A blank query clears the results without a request.
    ///
    /// # Errors
    ///
    /// Returns the request failure and sets an error notice.
    pub async fn search(&self, query: &str) -> Result<usize, ActionError> {
        let query = query.trim();
        if query.is_empty() {
            self.lookup.update(|l| {
                let changed = !l.results.is_empty();
                l.results.clear();
                changed
            });
            return Ok(0);
        }
        let path = search_path(query);
        let result = super::get::<Vec<WordSummary>>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            &path,
            Shape::Field("results"),
        )
        .await;
        let result = result.map(|results| {
            let count = results.len();
            self.lookup.update(|l| {
                l.results = results;
                true
            });
            count
        });
        action::report(&self.notices, "dictionary_search", result, |_| None)
    }

    /// Open one word's detail view.
    ///
    /// # Errors
    ///
    /// Any failure is reported as "word not found".
    pub async fn open_word(&self, word: &str) -> Result<WordEntry, ActionError> {
        let path = word_path(word.trim());
        let result = super::get::<WordEntry>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            &path,
            Shape::Field("word_data"),
        )
        .await;
        let result = match result {
            Ok(entry) => {
                let selected = entry.clone();
                self.lookup.update(|l| {
                    l.selected = Some(selected);
                    true
                });
                Ok(entry)
            }
            Err(ActionError::Closed) => Err(ActionError::Closed),
            Err(_) => Err(ActionError::Rejected(WORD_NOT_FOUND.to_owned())),
        };
        action::report(&self.notices, "open_word", result, |_| None)
    }

    pub fn close_word(&self) {
        self.lookup.update(|l| l.selected.take().is_some());
    }

    /// Teach one word. Blank input is ignored.
    ///
    /// # Errors
    ///
    /// Fails when a learn request is pending or the server rejects it.
    pub async fn learn_word(&self, word: &str) -> Result<bool, ActionError> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(false);
        }
        let _permit = self.learn_guard.try_acquire()?;
        let result = super::post::<()>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            LEARN_WORD_PATH,
            Some(json!({ "word": word })),
            Shape::Flag,
        )
        .await;
        if result.is_ok() {
            info!(word, "word learned");
            let _ = self.stats.refresh().await;
        }
        action::report(&self.notices, "learn_word", result.map(|()| true), |_| {
            Some(format!("word \"{word}\" learned"))
        })
    }

    pub fn close(&self) {
        self.scope.close();
    }
}
