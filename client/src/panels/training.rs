//! Neural training panel.
//!
//! Network info is fetched once on mount and again after each successful
//! run. A finished run shows its outcome for `RESET_DELAY` and then returns
//! to idle; the reset timer belongs to the panel scope.

#[cfg(test)]
#[path = "training_test.rs"]
mod training_test;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tracing::info;

use crate::action::{self, ActionError, ActionGuard, Notice, NoticeSlot, Rollback};
use crate::fetcher::{Endpoint, Feed, PanelState};
use crate::net::types::{NetworkInfo, TrainingReply};
use crate::net::{Shape, Transport};
use crate::scope::{Slot, ViewScope};
use crate::state::training::{TrainingMetrics, TrainingState};

pub const NETWORK_INFO: Endpoint = Endpoint::new("/api/red_neuronal_info", Shape::Raw);
pub const TRAIN_PATH: &str = "/api/entrenar_red_neuronal";
pub const RESET_DELAY: Duration = Duration::from_secs(3);

pub struct TrainingPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    info: Feed<NetworkInfo>,
    state: Slot<TrainingState>,
    notices: NoticeSlot,
    guard: ActionGuard,
}

impl TrainingPanel {
    /// Mount and load network info once.
    pub fn mount(transport: Arc<dyn Transport>) -> Self {
        let panel = Self::new(transport);
        let info = panel.info.clone();
        panel.scope.spawn(async move {
            let _ = info.refresh().await;
        });
        panel
    }

    fn new(transport: Arc<dyn Transport>) -> Self {
        let scope = ViewScope::new();
        let info = Feed::new(Arc::clone(&transport), NETWORK_INFO, &scope);
        let state = Slot::new(TrainingState::default(), scope.liveness());
        let notices = Slot::new(None, scope.liveness());
        Self { scope, transport, info, state, notices, guard: ActionGuard::new() }
    }

    #[must_use]
    pub fn network_info(&self) -> PanelState<NetworkInfo> {
        self.info.snapshot()
    }

    #[must_use]
    pub fn state(&self) -> TrainingState {
        self.state.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TrainingState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notices.get()
    }

    /// Reload network info.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; previous info is kept.
    pub async fn refresh_info(&self) -> Result<(), crate::net::ApiError> {
        self.info.refresh().await
    }

    /// Epoch count for the next run. Zero is ignored.
    pub fn set_epochs(&self, epochs: u64) {
        if epochs > 0 {
            self.state.update(|s| {
                let changed = s.epochs != epochs;
                s.epochs = epochs;
                changed
            });
        }
    }

    /// Run one training request.
    ///
    /// # Errors
    ///
    /// `InFlight` while a run is pending; otherwise the request failure,
    /// which also moves the panel to `Failed` and sets an error notice.
    /// Dropping the future before the reply lands returns the panel to idle.
    pub async fn train(&self) -> Result<TrainingMetrics, ActionError> {
        let _permit = self.guard.try_acquire()?;
        let mut started = None;
        self.state.update(|s| {
            started = s.begin();
            started.is_some()
        });
        let Some((run, epochs)) = started else {
            return Err(ActionError::InFlight);
        };
        let state = self.state.clone();
        let rollback = Rollback::new(move || {
            state.update(TrainingState::cancel);
        });

        let result = super::post::<TrainingReply>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            TRAIN_PATH,
            Some(json!({ "epochs": epochs })),
            Shape::Flagged,
        )
        .await;
        rollback.disarm();

        let outcome = match result {
            Ok(reply) => {
                let metrics = TrainingMetrics::from_reply(&reply, epochs);
                self.state.update(|s| {
                    s.finish_success(&reply);
                    true
                });
                info!(precision = metrics.precision, loss = metrics.loss, epochs = metrics.epochs, "training finished");
                Ok(metrics)
            }
            Err(e) => {
                self.state.update(|s| {
                    s.finish_failure();
                    true
                });
                Err(e)
            }
        };
        self.schedule_reset(run);
        if outcome.is_ok() {
            let _ = self.info.refresh().await;
        }
        action::report(&self.notices, "train", outcome, |m| {
            Some(format!("training completed: {:.1}% precision after {} epochs", m.precision, m.epochs))
        })
    }

    fn schedule_reset(&self, run: u64) {
        let state = self.state.clone();
        self.scope.spawn(async move {
            tokio::time::sleep(RESET_DELAY).await;
            state.update(|s| s.reset_after(run));
        });
    }

    pub fn close(&self) {
        self.scope.close();
    }
}
