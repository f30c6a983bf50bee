//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the parsed proxy config and one pooled upstream HTTP client that
//! every forwarded request reuses.

use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::routes::proxy::ProxyError;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: reqwest::Client,
}

impl AppState {
    /// Build state with an upstream client honoring the configured timeout.
    ///
    /// Redirects are not followed so the browser sees the backend's own
    /// `Location` headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let upstream = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProxyError::ClientBuild(e.to_string()))?;
        Ok(Self { config: Arc::new(config), upstream })
    }
}
