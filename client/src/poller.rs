//! Connectivity probe against `/api/status`.
//!
//! The poller is the only writer of `Connectivity`. Other panels hold a
//! `watch::Receiver` and read it synchronously with `borrow()`.

#[cfg(test)]
#[path = "poller_test.rs"]
mod poller_test;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::net::Transport;
use crate::scope::{Slot, ViewScope};

pub const STATUS_PATH: &str = "/api/status";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connectivity {
    #[default]
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        })
    }
}

#[derive(Clone)]
pub struct StatusPoller {
    transport: Arc<dyn Transport>,
    state: Slot<Connectivity>,
}

impl StatusPoller {
    pub fn new(transport: Arc<dyn Transport>, scope: &ViewScope) -> Self {
        Self { transport, state: Slot::new(Connectivity::Connecting, scope.liveness()) }
    }

    /// Issue one probe and record its outcome. Overlapping probes are not
    /// serialized; whichever resolves last wins.
    pub async fn probe(&self) -> Connectivity {
        let next = match self.transport.probe(STATUS_PATH).await {
            Ok(()) => Connectivity::Connected,
            Err(e) => {
                if self.state.is_alive() {
                    warn!(error = %e, "status probe failed");
                }
                Connectivity::Error
            }
        };
        let previous = self.current();
        if self.state.set(next) {
            info!(from = %previous, to = %next, "connectivity changed");
        }
        next
    }

    /// Probe on mount and every `period` until `scope` closes.
    pub fn spawn(&self, scope: &ViewScope, period: Duration) {
        let poller = self.clone();
        scope.spawn_interval(period, move || {
            let poller = poller.clone();
            async move {
                poller.probe().await;
            }
        });
    }

    #[must_use]
    pub fn current(&self) -> Connectivity {
        self.state.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.state.subscribe()
    }
}
