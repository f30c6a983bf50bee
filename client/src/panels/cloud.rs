//! Cloud feeds: recent emotions, aggregate stats and the "learn from AIs"
//! trigger. The newest emotion sample sets the panel mood, which drives the
//! robot face. The futuristic chat writes the same mood through
//! [`CloudPanel::mood_handle`].

#[cfg(test)]
#[path = "cloud_test.rs"]
mod cloud_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::action::{self, ActionError, ActionGuard, Notice, NoticeSlot, Rollback};
use crate::fetcher::{Endpoint, Feed, PanelState};
use crate::net::types::{CloudStats, EmotionSample};
use crate::net::{Shape, Transport};
use crate::scope::{Slot, ViewScope};
use crate::util::face::{self, Rgb};

pub const EMOTIONS: Endpoint = Endpoint::new("/api/cloud/emotions/recent", Shape::Raw);
pub const STATS: Endpoint = Endpoint::new("/api/cloud/stats", Shape::Raw);
pub const LEARN_PATH: &str = "/api/cloud/learn_from_ais";

#[derive(Clone, Debug, PartialEq)]
pub struct Mood {
    pub emotion: String,
    /// Color reported by the server alongside the emotion, when valid.
    pub color: Option<Rgb>,
}

impl Default for Mood {
    fn default() -> Self {
        Self::named("neutral")
    }
}

impl Mood {
    #[must_use]
    pub fn named(emotion: &str) -> Self {
        Self { emotion: emotion.to_owned(), color: None }
    }

    fn from_sample(sample: &EmotionSample) -> Self {
        Self { emotion: sample.emotion_type.clone(), color: face::parse_hex(&sample.color_code) }
    }
}

pub struct CloudPanel {
    scope: ViewScope,
    transport: Arc<dyn Transport>,
    emotions: Feed<Vec<EmotionSample>>,
    stats: Feed<CloudStats>,
    mood: Slot<Mood>,
    notices: NoticeSlot,
    learn_guard: ActionGuard,
}

impl CloudPanel {
    pub fn mount(transport: Arc<dyn Transport>, emotions_every: Duration, stats_every: Duration) -> Self {
        let panel = Self::new(transport);
        let (emotions, mood) = (panel.emotions.clone(), panel.mood.clone());
        panel.scope.spawn_interval(emotions_every, move || {
            let (emotions, mood) = (emotions.clone(), mood.clone());
            async move {
                sync_emotions(&emotions, &mood).await;
            }
        });
        panel.stats.spawn_polling(&panel.scope, stats_every);
        panel
    }

    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        let scope = ViewScope::new();
        let emotions = Feed::new(Arc::clone(&transport), EMOTIONS, &scope);
        let stats = Feed::new(Arc::clone(&transport), STATS, &scope);
        let mood = Slot::new(Mood::default(), scope.liveness());
        let notices = Slot::new(None, scope.liveness());
        Self { scope, transport, emotions, stats, mood, notices, learn_guard: ActionGuard::new() }
    }

    #[must_use]
    pub fn emotions(&self) -> PanelState<Vec<EmotionSample>> {
        self.emotions.snapshot()
    }

    #[must_use]
    pub fn stats(&self) -> PanelState<CloudStats> {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn mood(&self) -> Mood {
        self.mood.get()
    }

    #[must_use]
    pub fn subscribe_mood(&self) -> watch::Receiver<Mood> {
        self.mood.subscribe()
    }

    /// Writable handle on the mood, for the futuristic chat. Writes stop
    /// once this panel closes.
    #[must_use]
    pub fn mood_handle(&self) -> Slot<Mood> {
        self.mood.clone()
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notices.get()
    }

    /// Fetch recent emotions once and adopt the newest as the mood.
    pub async fn refresh_emotions(&self) {
        sync_emotions(&self.emotions, &self.mood).await;
    }

    /// Ask the backend to learn from external AIs. The mood shows `learning`
    /// while pending, then `satisfied` or `frustrated`. A dropped call puts
    /// the previous mood back.
    ///
    /// # Errors
    ///
    /// Fails when a run is pending or the request fails.
    pub async fn learn_from_ais(&self) -> Result<(), ActionError> {
        let _permit = self.learn_guard.try_acquire()?;
        let (mood, prior) = (self.mood.clone(), self.mood.get());
        self.mood.set(Mood::named("learning"));
        let rollback = Rollback::new(move || {
            mood.set(prior);
        });
        let result = super::post::<()>(self.transport.as_ref(), &self.scope.liveness(), LEARN_PATH, None, Shape::Flag).await;
        rollback.disarm();
        if result.is_ok() {
            self.mood.set(Mood::named("satisfied"));
            let _ = self.stats.refresh().await;
        } else {
            self.mood.set(Mood::named("frustrated"));
        }
        action::report(&self.notices, "learn_from_ais", result, |()| Some("cloud learning completed".to_owned()))
    }

    pub fn close(&self) {
        self.scope.close();
    }
}

async fn sync_emotions(emotions: &Feed<Vec<EmotionSample>>, mood: &Slot<Mood>) {
    if emotions.refresh().await.is_err() {
        return;
    }
    if let Some(latest) = emotions.with_data(|samples| samples.first().map(Mood::from_sample)) {
        if mood.set(latest) {
            debug!(emotion = %mood.with(|m| m.emotion.clone()), "mood changed");
        }
    }
}
