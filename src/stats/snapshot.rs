//! Running per-learner stats snapshot.
//!
//! The snapshot is only ever moved forward by adding a non-negative
//! [`StatsDelta`] computed from one attempt. The ledger is rescanned once,
//! as a backfill, when the snapshot is empty but attempts already exist.

use serde::{Deserialize, Serialize};

use crate::core::learner::Attempt;
use crate::core::preset::PresetKind;
use crate::core::session::Metrics;

/// Cumulative per-learner counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total_problems: u64,
    pub total_correct: u64,
    pub total_mistakes: u64,
    /// Whole seconds; each attempt's elapsed time is rounded.
    pub total_time_sec: u64,
    pub sessions_count: u64,
    pub perfect_sessions_count: u64,
    pub race_wins_count: u64,
}

/// A stats field achievements can be keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    TotalProblems,
    TotalCorrect,
    TotalMistakes,
    TotalTimeSec,
    SessionsCount,
    PerfectSessionsCount,
    RaceWinsCount,
}

/// Non-negative increment derived from one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub problems: u64,
    pub correct: u64,
    pub mistakes: u64,
    pub time_sec: u64,
    pub sessions: u64,
    pub perfect_sessions: u64,
    pub race_wins: u64,
}

impl StatsDelta {
    /// Compute the delta for one attempt.
    ///
    /// Correct answers are clamped to the problem count, a perfect session
    /// needs known zero mistakes, a race win needs a race preset and a
    /// recorded win.
    pub fn from_attempt(kind: &PresetKind, metrics: &Metrics) -> Self {
        let elapsed = if metrics.elapsed_sec.is_finite() {
            metrics.elapsed_sec.max(0.0).round() as u64
        } else {
            0
        };
        Self {
            problems: u64::from(metrics.total),
            correct: u64::from(metrics.clamped_correct()),
            mistakes: u64::from(metrics.mistakes.unwrap_or(0)),
            time_sec: elapsed,
            sessions: 1,
            perfect_sessions: u64::from(metrics.is_perfect()),
            race_wins: u64::from(kind.is_race() && metrics.won == Some(true)),
        }
    }
}

impl UserStats {
    /// Add a delta. Counters saturate instead of wrapping.
    pub fn apply(&mut self, delta: &StatsDelta) {
        self.total_problems = self.total_problems.saturating_add(delta.problems);
        self.total_correct = self.total_correct.saturating_add(delta.correct);
        self.total_mistakes = self.total_mistakes.saturating_add(delta.mistakes);
        self.total_time_sec = self.total_time_sec.saturating_add(delta.time_sec);
        self.sessions_count = self.sessions_count.saturating_add(delta.sessions);
        self.perfect_sessions_count = self
            .perfect_sessions_count
            .saturating_add(delta.perfect_sessions);
        self.race_wins_count = self.race_wins_count.saturating_add(delta.race_wins);
    }

    /// Whether no session has been counted yet.
    pub fn is_empty(&self) -> bool {
        self.sessions_count == 0
    }

    /// Rebuild a snapshot from the ledger.
    ///
    /// Training attempts are skipped unless `include_training` is set, so the
    /// backfill agrees with what incremental recording would have produced.
    pub fn backfill(attempts: &[Attempt], include_training: bool) -> Self {
        let mut stats = Self::default();
        for attempt in attempts {
            let kind = attempt.level.kind();
            if kind.is_training() && !include_training {
                continue;
            }
            stats.apply(&StatsDelta::from_attempt(&kind, &attempt.metrics));
        }
        stats
    }

    /// Read one field.
    pub fn get(&self, field: StatField) -> u64 {
        match field {
            StatField::TotalProblems => self.total_problems,
            StatField::TotalCorrect => self.total_correct,
            StatField::TotalMistakes => self.total_mistakes,
            StatField::TotalTimeSec => self.total_time_sec,
            StatField::SessionsCount => self.sessions_count,
            StatField::PerfectSessionsCount => self.perfect_sessions_count,
            StatField::RaceWinsCount => self.race_wins_count,
        }
    }

    /// Overall accuracy in percent, `None` before any problem.
    pub fn accuracy_percent(&self) -> Option<f64> {
        if self.total_problems == 0 {
            return None;
        }
        Some(self.total_correct as f64 * 100.0 / self.total_problems as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::preset::PresetId;
    use chrono::Utc;

    fn metrics(total: u32, correct: u32, mistakes: u32, secs: f64) -> Metrics {
        Metrics {
            total,
            solved: total,
            correct,
            mistakes: Some(mistakes),
            elapsed_sec: secs,
            ..Default::default()
        }
    }

    #[test]
    fn test_two_attempts_accumulate() {
        let mut stats = UserStats::default();
        stats.apply(&StatsDelta::from_attempt(
            &PresetKind::Accuracy,
            &metrics(10, 8, 2, 30.0),
        ));
        stats.apply(&StatsDelta::from_attempt(
            &PresetKind::Accuracy,
            &metrics(5, 5, 0, 10.0),
        ));

        assert_eq!(stats.total_problems, 15);
        assert_eq!(stats.total_correct, 13);
        assert_eq!(stats.total_mistakes, 2);
        assert_eq!(stats.total_time_sec, 40);
        assert_eq!(stats.sessions_count, 2);
        assert_eq!(stats.perfect_sessions_count, 1);
        assert_eq!(stats.race_wins_count, 0);
    }

    #[test]
    fn test_correct_is_clamped() {
        let delta = StatsDelta::from_attempt(&PresetKind::Training, &metrics(3, 7, 0, 1.0));
        assert_eq!(delta.correct, 3);
    }

    #[test]
    fn test_unknown_mistakes_never_perfect() {
        let mut m = metrics(5, 5, 0, 1.0);
        m.mistakes = None;
        let delta = StatsDelta::from_attempt(&PresetKind::Accuracy, &m);
        assert_eq!(delta.perfect_sessions, 0);
        assert_eq!(delta.mistakes, 0);
    }

    #[test]
    fn test_race_win_requires_race_preset() {
        let mut m = metrics(5, 5, 0, 1.0);
        m.won = Some(true);
        assert_eq!(
            StatsDelta::from_attempt(&PresetKind::Race(2), &m).race_wins,
            1
        );
        assert_eq!(StatsDelta::from_attempt(&PresetKind::Speed, &m).race_wins, 0);
        m.won = Some(false);
        assert_eq!(
            StatsDelta::from_attempt(&PresetKind::Race(2), &m).race_wins,
            0
        );
    }

    #[test]
    fn test_bad_elapsed_counts_as_zero() {
        let delta = StatsDelta::from_attempt(&PresetKind::Speed, &metrics(1, 1, 0, f64::NAN));
        assert_eq!(delta.time_sec, 0);
    }

    #[test]
    fn test_backfill_matches_incremental() {
        let attempts: Vec<Attempt> = [("accuracy", 10, 8, 2), ("training", 4, 4, 0)]
            .iter()
            .map(|(level, total, correct, mistakes)| Attempt {
                learner_id: "ada".to_string(),
                trainer_id: "column-addition".to_string(),
                token: None,
                kind: "column".to_string(),
                level: PresetId::new(*level),
                success: true,
                metrics: metrics(*total, *correct, *mistakes, 5.0),
                created_at: Utc::now(),
            })
            .collect();

        let with_training = UserStats::backfill(&attempts, true);
        assert_eq!(with_training.sessions_count, 2);
        assert_eq!(with_training.total_problems, 14);

        let without = UserStats::backfill(&attempts, false);
        assert_eq!(without.sessions_count, 1);
        assert_eq!(without.get(StatField::TotalProblems), 10);
    }

    #[test]
    fn test_accuracy_percent() {
        let mut stats = UserStats::default();
        assert!(stats.accuracy_percent().is_none());
        stats.total_problems = 4;
        stats.total_correct = 3;
        assert_eq!(stats.accuracy_percent(), Some(75.0));
    }
}
