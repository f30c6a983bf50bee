//! Knowledge panel: learning stats, teaching concepts and exporting.

#[cfg(test)]
#[path = "learning_test.rs"]
mod learning_test;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tracing::info;

use crate::action::{self, ActionError, ActionGuard, Notice, NoticeSlot};
use crate::fetcher::{Endpoint, Feed, PanelState};
use crate::net::types::{ExportedKnowledge, LearningStats, TeachReply};
use crate::net::{Shape, Transport};
use crate::scope::{Slot, ViewScope};

pub const STATS: Endpoint = Endpoint::new("/api/learning/stats", Shape::Field("stats"));
pub const TEACH_PATH: &str = "/api/learning/teach";
pub const EXPORT_PATH: &str = "/api/learning/export";

const TEACH_INCOMPLETE: &str = "both a concept and a definition are required";

pub struct LearningPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    stats: Feed<LearningStats>,
    exported: Slot<Option<ExportedKnowledge>>,
    notices: NoticeSlot,
    teach_guard: ActionGuard,
    export_guard: ActionGuard,
}

impl LearningPanel {
    pub fn mount(transport: Arc<dyn Transport>, period: Duration) -> Self {
        let panel = Self::new(transport);
        panel.stats.spawn_polling(&panel.scope, period);
        panel
    }

    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        let scope = ViewScope::new();
        let stats = Feed::new(Arc::clone(&transport), STATS, &scope);
        let exported = Slot::new(None, scope.liveness());
        let notices = Slot::new(None, scope.liveness());
        Self {
            scope,
            transport,
            stats,
            exported,
            notices,
            teach_guard: ActionGuard::new(),
            export_guard: ActionGuard::new(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> PanelState<LearningStats> {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PanelState<LearningStats>> {
        self.stats.subscribe()
    }

    #[must_use]
    pub fn exported(&self) -> Option<ExportedKnowledge> {
        self.exported.get()
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

    /// Teach `concept` with `definition`. Both must be non-blank; otherwise a
    /// notice is shown and nothing is sent.
    ///
    /// # Errors
    ///
    /// `Rejected` for blank input, or the request failure.
    pub async fn teach(&self, concept: &str, definition: &str) -> Result<(), ActionError> {
        let (concept, definition) = (concept.trim(), definition.trim());
        if concept.is_empty() || definition.is_empty() {
            return action::report(&self.notices, "teach", Err(ActionError::Rejected(TEACH_INCOMPLETE.to_owned())), |()| None);
        }
        let _permit = self.teach_guard.try_acquire()?;
        let result = super::post::<TeachReply>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            TEACH_PATH,
            Some(json!({ "concept": concept, "definition": definition })),
            Shape::Flagged,
        )
        .await;

        let result = match result {
            Ok(reply) => {
                info!(concept, "concept taught");
                let _ = self.stats.refresh().await;
                Ok(reply.message.unwrap_or_else(|| format!("learned \"{concept}\"")))
            }
            Err(e) => Err(e),
        };
        action::report(&self.notices, "teach", result, |message| Some(message.clone())).map(|_| ())
    }

    /// Fetch the exported knowledge base and keep it on the panel.
    ///
    /// # Errors
    ///
    /// Fails when an export is pending or the request fails.
    pub async fn export(&self) -> Result<ExportedKnowledge, ActionError> {
        let _permit = self.export_guard.try_acquire()?;
        let result = super::get::<ExportedKnowledge>(
            self.transport.as_ref(),
            &self.scope.liveness(),
            EXPORT_PATH,
            Shape::Field("knowledge"),
        )
        .await;
        if let Ok(knowledge) = &result {
            self.exported.set(Some(knowledge.clone()));
        }
        action::report(&self.notices, "export", result, |k| {
            Some(format!("exported {} concepts", k.concepts.len()))
        })
    }

    pub fn close(&self) {
        self.scope.close();
    }
}
