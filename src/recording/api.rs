//! Collaborator contract between the session flow and persistence.
//!
//! The flow only sees [`ProgressApi`]; whether the other side is a local
//! [`Recorder`] or a remote service is not its concern.

use std::sync::Arc;

use crate::core::Progress;
use crate::error::Result;
use crate::recording::{RecordOutcome, RecordRequest, Recorder};
use crate::stats::{AchievementView, StatsSummary};
use crate::storage::LearnerStore;

/// Progress, recording and projection calls.
pub trait ProgressApi: Send + Sync {
    /// Read-only progress fetch for one trainer.
    fn load_progress(&self, learner_id: &str, trainer_id: &str) -> Result<Progress>;

    /// Run the recording protocol. Safe to call again with the same token.
    fn record_attempt(&self, request: &RecordRequest) -> Result<RecordOutcome>;

    /// Catalog joined with the learner's achievement states.
    fn load_achievements(&self, learner_id: &str) -> Result<Vec<AchievementView>>;

    /// Totals plus the daily success histogram.
    fn load_stats_summary(&self, learner_id: &str) -> Result<StatsSummary>;
}

impl<S: LearnerStore> ProgressApi for Recorder<S> {
    fn load_progress(&self, learner_id: &str, trainer_id: &str) -> Result<Progress> {
        self.progress(learner_id, trainer_id)
    }

    fn record_attempt(&self, request: &RecordRequest) -> Result<RecordOutcome> {
        self.record(request)
    }

    fn load_achievements(&self, learner_id: &str) -> Result<Vec<AchievementView>> {
        self.achievements(learner_id)
    }

    fn load_stats_summary(&self, learner_id: &str) -> Result<StatsSummary> {
        self.stats_summary(learner_id)
    }
}

impl<T: ProgressApi + ?Sized> ProgressApi for Arc<T> {
    fn load_progress(&self, learner_id: &str, trainer_id: &str) -> Result<Progress> {
        (**self).load_progress(learner_id, trainer_id)
    }

    fn record_attempt(&self, request: &RecordRequest) -> Result<RecordOutcome> {
        (**self).record_attempt(request)
    }

    fn load_achievements(&self, learner_id: &str) -> Result<Vec<AchievementView>> {
        (**self).load_achievements(learner_id)
    }

    fn load_stats_summary(&self, learner_id: &str) -> Result<StatsSummary> {
        (**self).load_stats_summary(learner_id)
    }
}
