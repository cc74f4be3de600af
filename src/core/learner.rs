//! Per-learner persisted document.
//!
//! Progress, the attempt ledger, the stats snapshot and achievement states
//! live in one document so a recording commits all of them with a single
//! atomic write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::preset::PresetId;
use crate::core::progress::{Archetype, Progress};
use crate::core::session::{AttemptToken, Metrics};
use crate::error::{AbacusError, Result};
use crate::stats::{AchievementState, UserStats};

/// Longest accepted learner id.
pub const MAX_LEARNER_ID_LEN: usize = 64;

/// Validate a learner id. Ids double as file names.
pub fn validate_learner_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AbacusError::validation("learner id must not be empty"));
    }
    if id.len() > MAX_LEARNER_ID_LEN {
        return Err(AbacusError::validation(format!(
            "learner id must be at most {} characters",
            MAX_LEARNER_ID_LEN
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AbacusError::validation(format!(
            "learner id '{}' may only contain letters, digits, '_' and '-'",
            id
        )));
    }
    Ok(())
}

/// Immutable ledger entry for one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub learner_id: String,
    pub trainer_id: String,
    /// Dedup key; absent tokens disable dedup for that call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AttemptToken>,
    /// Recording kind of the trainer, e.g. `column`.
    pub kind: String,
    /// Preset the session was played on.
    pub level: PresetId,
    pub success: bool,
    pub metrics: Metrics,
    pub created_at: DateTime<Utc>,
}

/// Everything stored about one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerRecord {
    pub learner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Progress keyed by trainer id; created lazily.
    #[serde(default)]
    pub progress: BTreeMap<String, Progress>,
    /// Append-only attempt ledger.
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default)]
    pub stats: UserStats,
    /// The snapshot has been kept in step with the ledger. Documents written
    /// before the snapshot existed lack it and get one backfill.
    #[serde(default)]
    pub stats_tracked: bool,
    /// Achievement states keyed by achievement id.
    #[serde(default)]
    pub achievements: BTreeMap<String, AchievementState>,
}

impl LearnerRecord {
    /// Empty document for a new learner.
    pub fn new(learner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            learner_id: learner_id.into(),
            created_at: now,
            updated_at: now,
            progress: BTreeMap::new(),
            attempts: Vec::new(),
            stats: UserStats::default(),
            stats_tracked: true,
            achievements: BTreeMap::new(),
        }
    }

    /// Whether the snapshot must be rebuilt from the ledger before use.
    pub fn needs_stats_backfill(&self) -> bool {
        !self.stats_tracked && self.stats.is_empty() && !self.attempts.is_empty()
    }

    /// Find a previously recorded attempt by its dedup key.
    pub fn find_attempt(&self, trainer_id: &str, token: &AttemptToken) -> Option<&Attempt> {
        self.attempts
            .iter()
            .find(|a| a.trainer_id == trainer_id && a.token.as_ref() == Some(token))
    }

    /// Stored progress for a trainer, normalized to its archetype.
    pub fn progress_for(&self, trainer_id: &str, archetype: Archetype) -> Progress {
        self.progress
            .get(trainer_id)
            .map(|p| p.normalize(archetype))
            .unwrap_or_else(|| Progress::default_for(archetype))
    }

    /// Update the timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
