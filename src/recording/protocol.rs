//! The recording protocol.
//!
//! One call to [`Recorder::record`] is one atomic unit: ledger insert,
//! progress merge, stats delta and achievement evaluation are applied to a
//! copy of the learner document, and the copy is committed with a single
//! `put`. A failure at any step leaves the stored document untouched.
//!
//! Recordings for the same learner are serialized by a per-learner mutex,
//! and across processes by the store's learner lock. That scope covers both
//! the per-trainer progress update and the shared stats snapshot. Different
//! learners record concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{Config, RecordingConfig};
use crate::core::{
    validate_learner_id, Attempt, AttemptToken, LearnerRecord, PresetId, Progress, SessionResult,
};
use crate::error::{AbacusError, Result};
use crate::stats::{
    catalog, evaluate_achievements, project_achievements, AchievementDefinition, AchievementView,
    StatsDelta, StatsSummary, UnlockedAchievement, UserStats,
};
use crate::storage::LearnerStore;
use crate::trainers::{TrainerAdapter, TrainerRegistry};

/// Input of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRequest {
    pub learner_id: String,
    pub trainer_id: String,
    /// Dedup key. Without it the call cannot be made idempotent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AttemptToken>,
    pub preset_id: PresetId,
    pub result: SessionResult,
}

/// Output of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Trainer progress after the recording (or as stored, for a duplicate).
    pub progress: Progress,
    /// The token had already been recorded; nothing was applied.
    pub duplicate: bool,
    pub newly_unlocked: Vec<UnlockedAchievement>,
    /// Learner stats after the recording.
    pub stats: UserStats,
}

/// Applies recordings to learner documents.
pub struct Recorder<S: LearnerStore> {
    store: S,
    registry: TrainerRegistry,
    recording: RecordingConfig,
    history_days: u32,
    catalog: &'static [AchievementDefinition],
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: LearnerStore> Recorder<S> {
    /// Create a recorder over a store and a trainer registry.
    pub fn new(store: S, registry: TrainerRegistry, config: &Config) -> Self {
        Self {
            store,
            registry,
            recording: config.recording.clone(),
            history_days: config.stats.history_days,
            catalog: catalog(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &TrainerRegistry {
        &self.registry
    }

    /// Per-learner lock handle.
    fn learner_lock(&self, learner_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| AbacusError::transient("recorder lock table poisoned"))?;
        Ok(Arc::clone(
            locks
                .entry(learner_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    fn acquire<'a>(lock: &'a Mutex<()>, learner_id: &str) -> Result<MutexGuard<'a, ()>> {
        lock.lock().map_err(|_| {
            AbacusError::transient(format!("learner lock for '{}' poisoned", learner_id))
        })
    }

    fn load(&self, learner_id: &str) -> Result<LearnerRecord> {
        Ok(self
            .store
            .get(learner_id)?
            .unwrap_or_else(|| LearnerRecord::new(learner_id)))
    }

    /// Reject malformed requests before anything is read or written.
    fn validate(&self, request: &RecordRequest) -> Result<Arc<dyn TrainerAdapter>> {
        validate_learner_id(&request.learner_id)?;
        let adapter = self.registry.get(&request.trainer_id)?;
        adapter.trainer().require_preset(&request.preset_id)?;
        request.result.metrics.validate()?;

        if request.token.is_none() {
            if self.recording.require_token {
                return Err(AbacusError::validation("attempt token is required"));
            }
            tracing::warn!(
                learner = %request.learner_id,
                trainer = %request.trainer_id,
                "recording without attempt token; retries of this call will double count"
            );
        }
        Ok(adapter)
    }

    /// Record one attempt.
    pub fn record(&self, request: &RecordRequest) -> Result<RecordOutcome> {
        let adapter = self.validate(request)?;
        let trainer = adapter.trainer();
        let metrics = adapter.attempt_metrics(&request.result);
        metrics.validate()?;

        let lock = self.learner_lock(&request.learner_id)?;
        let _guard = Self::acquire(&lock, &request.learner_id)?;
        // other processes sharing the store
        let _store_lock = self.store.lock(&request.learner_id)?;

        let current = self.load(&request.learner_id)?;

        // 1. ledger: a known token is a duplicate, not an error
        if let Some(token) = &request.token {
            if current.find_attempt(&request.trainer_id, token).is_some() {
                tracing::info!(
                    learner = %request.learner_id,
                    trainer = %request.trainer_id,
                    token = %token,
                    "duplicate recording ignored"
                );
                return Ok(RecordOutcome {
                    progress: current.progress_for(&request.trainer_id, trainer.archetype),
                    duplicate: true,
                    newly_unlocked: Vec::new(),
                    stats: current.stats,
                });
            }
        }

        let mut next = current.clone();
        let kind = request.preset_id.kind();

        // 2. progress merge
        let stored = next.progress.get(&request.trainer_id).copied();
        let mut progress = next.progress_for(&request.trainer_id, trainer.archetype);
        let changed = progress.apply(&kind, &request.result);
        if changed || stored.is_some_and(|s| s != progress) {
            next.progress.insert(request.trainer_id.clone(), progress);
        }

        // 3. stats delta
        let feeds_stats = !kind.is_training() || self.recording.training_feeds_stats;
        if next.needs_stats_backfill() {
            next.stats = UserStats::backfill(&next.attempts, self.recording.training_feeds_stats);
            tracing::info!(
                learner = %request.learner_id,
                attempts = next.attempts.len(),
                "backfilled stats snapshot from ledger"
            );
        }
        next.stats_tracked = true;
        let before = next.stats.clone();
        if feeds_stats {
            next.stats.apply(&StatsDelta::from_attempt(&kind, &metrics));
        }

        // 4. achievements
        let now = Utc::now();
        let evaluation =
            evaluate_achievements(self.catalog, &next.achievements, &before, &next.stats, now);
        next.achievements.extend(evaluation.changed);

        next.attempts.push(Attempt {
            learner_id: request.learner_id.clone(),
            trainer_id: request.trainer_id.clone(),
            token: request.token.clone(),
            kind: trainer.kind.clone(),
            level: request.preset_id.clone(),
            success: request.result.success,
            metrics,
            created_at: now,
        });
        next.updated_at = now;

        // commit
        self.store.put(&next)?;

        tracing::info!(
            learner = %request.learner_id,
            trainer = %request.trainer_id,
            preset = %request.preset_id,
            success = request.result.success,
            progress_changed = changed,
            unlocked = evaluation.newly_unlocked.len(),
            "recorded attempt"
        );

        Ok(RecordOutcome {
            progress,
            duplicate: false,
            newly_unlocked: evaluation.newly_unlocked,
            stats: next.stats,
        })
    }

    /// Read a learner's progress on one trainer.
    pub fn progress(&self, learner_id: &str, trainer_id: &str) -> Result<Progress> {
        validate_learner_id(learner_id)?;
        let adapter = self.registry.get(trainer_id)?;
        Ok(self
            .load(learner_id)?
            .progress_for(trainer_id, adapter.trainer().archetype))
    }

    /// Catalog joined with the learner's achievement states.
    pub fn achievements(&self, learner_id: &str) -> Result<Vec<AchievementView>> {
        validate_learner_id(learner_id)?;
        let record = self.load(learner_id)?;
        Ok(project_achievements(self.catalog, &record.achievements))
    }

    /// Totals plus the success histogram.
    pub fn stats_summary(&self, learner_id: &str) -> Result<StatsSummary> {
        validate_learner_id(learner_id)?;
        let record = self.load(learner_id)?;
        Ok(StatsSummary::build(&record, self.history_days, Utc::now()))
    }
}
