#[cfg(test)]
#[path = "search_test.rs"]
mod search_test;

use crate::net::types::RawSearchHit;

/// Most recent distinct queries kept for quick re-runs.
pub const MAX_RECENT: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
}

impl From<RawSearchHit> for SearchResult {
    fn from(hit: RawSearchHit) -> Self {
        Self { title: hit.titulo, description: hit.contenido, url: hit.url, source: hit.fuente }
    }
}

/// Web search panel state. Bookmarks are keyed by URL and keep the order
/// in which they were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub recent: Vec<String>,
    pub bookmarks: Vec<SearchResult>,
    pub searching: bool,
}

impl SearchState {
    /// Start a search for the current query. Returns `None` when the query
    /// is blank or a search is already running.
    pub fn begin(&mut self) -> Option<String> {
        let query = self.query.trim();
        if query.is_empty() || self.searching {
            return None;
        }
        let query = query.to_owned();
        self.searching = true;
        Some(query)
    }

    pub fn finish_success(&mut self, query: &str, hits: Vec<RawSearchHit>) {
        self.results = hits.into_iter().map(SearchResult::from).collect();
        self.remember(query);
        self.searching = false;
    }

    pub fn finish_failure(&mut self) {
        self.results.clear();
        self.searching = false;
    }

    /// Abandon a running search without touching the results.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.searching, false)
    }

    fn remember(&mut self, query: &str) {
        self.recent.retain(|q| q != query);
        self.recent.insert(0, query.to_owned());
        self.recent.truncate(MAX_RECENT);
    }

    /// Add or remove `result` from the bookmarks. Returns whether it is
    /// bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, result: &SearchResult) -> bool {
        if self.is_bookmarked(&result.url) {
            self.bookmarks.retain(|b| b.url != result.url);
            false
        } else {
            self.bookmarks.push(result.clone());
            true
        }
    }

    #[must_use]
    pub fn is_bookmarked(&self, url: &str) -> bool {
        self.bookmarks.iter().any(|b| b.url == url)
    }
}
