//! The mounted dashboard: one status poller plus every panel.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each panel owns its own scope and timers. The dashboard wires the
//! connectivity receiver and the cloud mood into the chat panel and closes
//! everything on `unmount`.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::sync::Arc;

use tracing::info;

use crate::config::{ClientConfig, PollIntervals};
use crate::net::{ApiError, HttpTransport, Transport};
use crate::panels::advanced::AdvancedLearningPanel;
use crate::panels::auto_learning::AutoLearningPanel;
use crate::panels::chat::ChatPanel;
use crate::panels::cloud::CloudPanel;
use crate::panels::dictionary::DictionaryPanel;
use crate::panels::learning::LearningPanel;
use crate::panels::search::SearchPanel;
use crate::panels::training::TrainingPanel;
use crate::poller::StatusPoller;
use crate::scope::ViewScope;
use crate::state::chat::Role;
use crate::util::face::DEFAULT_CONFIDENCE;

pub struct Dashboard {
    scope: ViewScope,
    pub poller: StatusPoller,
    pub chat: ChatPanel,
    pub search: SearchPanel,
    pub auto_learning: AutoLearningPanel,
    pub learning: LearningPanel,
    pub dictionary: DictionaryPanel,
    pub training: TrainingPanel,
    pub advanced: AdvancedLearningPanel,
    pub cloud: CloudPanel,
}

impl Dashboard {
    /// Build an HTTP transport from `config` and mount every panel.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        info!(base_url = %config.base_url, chat_mode = ?config.chat_mode, "mounting dashboard");
        let dashboard = Self::mount(transport, &config.intervals);
        dashboard.chat.set_mode(config.chat_mode);
        Ok(dashboard)
    }

    /// Mount every panel over `transport`. Must be called inside a tokio
    /// runtime since panels start their timers immediately.
    pub fn mount(transport: Arc<dyn Transport>, intervals: &PollIntervals) -> Self {
        let scope = ViewScope::new();
        let poller = StatusPoller::new(Arc::clone(&transport), &scope);
        poller.spawn(&scope, intervals.status);
        let cloud = CloudPanel::mount(Arc::clone(&transport), intervals.emotions, intervals.cloud_stats);

        Self {
            chat: ChatPanel::mount(Arc::clone(&transport), poller.subscribe()).with_mood(cloud.mood_handle()),
            search: SearchPanel::mount(Arc::clone(&transport)),
            auto_learning: AutoLearningPanel::mount(Arc::clone(&transport), intervals.auto_learning),
            learning: LearningPanel::mount(Arc::clone(&transport), intervals.learning),
            dictionary: DictionaryPanel::mount(Arc::clone(&transport), intervals.dictionary),
            training: TrainingPanel::mount(Arc::clone(&transport)),
            advanced: AdvancedLearningPanel::mount(transport, intervals.advanced),
            cloud,
            scope,
            poller,
        }
    }

    /// Emotion and confidence the robot face should show: the shared mood
    /// and the confidence of the latest assistant reply.
    #[must_use]
    pub fn face_mood(&self) -> (String, f64) {
        let emotion = self.cloud.mood().emotion;
        let confidence = self
            .chat
            .transcript()
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .and_then(|m| m.confidence)
            .unwrap_or(DEFAULT_CONFIDENCE);
        (emotion, confidence)
    }

    /// Close every scope. Requests still in flight resolve without effect.
    pub fn unmount(&self) {
        self.scope.close();
        self.chat.close();
        self.search.close();
        self.auto_learning.close();
        self.learning.close();
        self.dictionary.close();
        self.training.close();
        self.advanced.close();
        self.cloud.close();
        info!("dashboard unmounted");
    }
}
