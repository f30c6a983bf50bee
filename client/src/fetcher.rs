//! Generic panel data fetcher.
//!
//! DESIGN
//! ======
//! A `Feed<T>` binds one GET endpoint and its response `Shape` to a
//! `Slot<PanelState<T>>`. `refresh()` replaces `data` wholesale on success.
//! On failure the previous data is kept and the panel is marked `stale`
//! with the failure text in `last_error`; background misses never raise a
//! notice.
//!
//! SYSTEM CONTEXT
//! ==============
//! Panels create feeds from their own `ViewScope`, so a refresh that
//! resolves after unmount is discarded by the slot's liveness check.

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod fetcher_test;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::net::envelope::adapt;
use crate::net::{ApiError, Shape, Transport};
use crate::scope::{Slot, ViewScope};

/// Last-known state of one panel feed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelState<T> {
    pub data: T,
    /// At least one refresh has succeeded.
    pub loaded: bool,
    /// The most recent refresh failed; `data` is from an earlier success.
    pub stale: bool,
    pub last_error: Option<String>,
}

/// A GET endpoint and how its body is wrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub path: &'static str,
    pub shape: Shape,
}

impl Endpoint {
    #[must_use]
    pub const fn new(path: &'static str, shape: Shape) -> Self {
        Self { path, shape }
    }
}

pub struct Feed<T> {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    state: Slot<PanelState<T>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self { transport: Arc::clone(&self.transport), endpoint: self.endpoint, state: self.state.clone() }
    }
}

impl<T> Feed<T>
where
    T: DeserializeOwned + Default + Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(transport: Arc<dyn Transport>, endpoint: Endpoint, scope: &ViewScope) -> Self {
        Self { transport, endpoint, state: Slot::new(PanelState::default(), scope.liveness()) }
    }

    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Fetch once and apply the outcome.
    ///
    /// # Errors
    ///
    /// Returns the transport or adapter error. The panel state has already
    /// been marked stale when this returns `Err`.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let path = self.endpoint.path;
        let result = match self.transport.get_json(path).await {
            Ok(body) => adapt::<T>(self.endpoint.shape, path, body),
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => {
                self.state.set(PanelState { data, loaded: true, stale: false, last_error: None });
                debug!(path, "panel refreshed");
                Ok(())
            }
            Err(e) => {
                if self.state.is_alive() {
                    warn!(path, error = %e, "panel refresh failed; keeping previous data");
                }
                let message = e.to_string();
                self.state.update(|s| {
                    let changed = !s.stale || s.last_error.as_deref() != Some(message.as_str());
                    s.stale = true;
                    s.last_error = Some(message);
                    changed
                });
                Err(e)
            }
        }
    }

    /// Refresh on mount and then every `period` until `scope` closes.
    pub fn spawn_polling(&self, scope: &ViewScope, period: Duration) {
        let feed = self.clone();
        scope.spawn_interval(period, move || {
            let feed = feed.clone();
            async move {
                let _ = feed.refresh().await;
            }
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> PanelState<T> {
        self.state.get()
    }

    #[must_use]
    pub fn data(&self) -> T {
        self.state.with(|s| s.data.clone())
    }

    /// Read the current data without cloning it.
    pub fn with_data<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        self.state.with(|s| read(&s.data))
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PanelState<T>> {
        self.state.subscribe()
    }
}
