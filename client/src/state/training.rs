#[cfg(test)]
#[path = "training_test.rs"]
mod training_test;

use crate::net::types::TrainingReply;

pub const DEFAULT_EPOCHS: u64 = 50;
const MIN_LOSS: f64 = 0.05;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrainingPhase {
    #[default]
    Idle,
    Training,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingMetrics {
    pub precision: f64,
    pub loss: f64,
    pub epochs: u64,
}

impl TrainingMetrics {
    /// Derive display metrics from a training reply. The backend reports
    /// accuracy as a percentage; loss is a rough complement of it. Without an
    /// accuracy the precision reads 0 and the loss takes the nominal value.
    #[must_use]
    pub fn from_reply(reply: &TrainingReply, requested_epochs: u64) -> Self {
        let epochs = if reply.epochs_completed == 0 { requested_epochs } else { reply.epochs_completed };
        Self {
            precision: reply.accuracy_final.unwrap_or(0.0),
            loss: reply.accuracy_final.map_or(MIN_LOSS, loss_for),
            epochs,
        }
    }
}

/// `(100 - accuracy) * 0.1` rounded to two decimals, floored at a nominal
/// value when that rounds to zero.
#[must_use]
pub fn loss_for(accuracy: f64) -> f64 {
    let loss = ((100.0 - accuracy) * 0.1 * 100.0).round() / 100.0;
    if loss.abs() < f64::EPSILON || !loss.is_finite() { MIN_LOSS } else { loss }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingState {
    pub phase: TrainingPhase,
    pub epochs: u64,
    pub metrics: Option<TrainingMetrics>,
    /// Bumped on every run so a stale reset timer can tell it was superseded.
    pub run: u64,
}

impl Default for TrainingState {
    fn default() -> Self {
        Self { phase: TrainingPhase::Idle, epochs: DEFAULT_EPOCHS, metrics: None, run: 0 }
    }
}

impl TrainingState {
    #[must_use]
    pub fn is_training(&self) -> bool {
        self.phase == TrainingPhase::Training
    }

    /// Enter `Training`; returns the run number and epoch count to request.
    pub fn begin(&mut self) -> Option<(u64, u64)> {
        if self.is_training() {
            return None;
        }
        self.run += 1;
        self.phase = TrainingPhase::Training;
        Some((self.run, self.epochs))
    }

    pub fn finish_success(&mut self, reply: &TrainingReply) {
        self.metrics = Some(TrainingMetrics::from_reply(reply, self.epochs));
        self.phase = TrainingPhase::Succeeded;
    }

    pub fn finish_failure(&mut self) {
        self.phase = TrainingPhase::Failed;
    }

    /// Abandon a pending run. The run number stays bumped so no reset timer
    /// from an earlier run can act on the next one.
    pub fn cancel(&mut self) -> bool {
        if !self.is_training() {
            return false;
        }
        self.phase = TrainingPhase::Idle;
        true
    }

    /// Return to `Idle` after a finished run, unless another run started since.
    pub fn reset_after(&mut self, run: u64) -> bool {
        if self.run != run || self.is_training() || self.phase == TrainingPhase::Idle {
            return false;
        }
        self.phase = TrainingPhase::Idle;
        true
    }
}
