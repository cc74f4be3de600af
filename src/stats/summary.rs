//! Stats summary projection.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MAX_HISTORY_DAYS;
use crate::core::learner::LearnerRecord;
use crate::stats::snapshot::UserStats;

/// Successful sessions on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySuccess {
    pub date: NaiveDate,
    pub successful_sessions: u32,
    /// At least one successful session that day.
    pub active: bool,
}

/// Aggregate totals plus a per-day success histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub totals: UserStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_percent: Option<f64>,
    /// Oldest day first, today last.
    pub history: Vec<DaySuccess>,
    pub active_days: u32,
}

impl StatsSummary {
    /// Build the summary for the `days` days ending at `now`. The window
    /// is capped at `MAX_HISTORY_DAYS`.
    pub fn build(record: &LearnerRecord, days: u32, now: DateTime<Utc>) -> Self {
        let days = days.min(MAX_HISTORY_DAYS);
        let today = now.date_naive();
        let mut history: Vec<DaySuccess> = (0..days)
            .rev()
            .map(|offset| DaySuccess {
                date: today - Duration::days(i64::from(offset)),
                successful_sessions: 0,
                active: false,
            })
            .collect();

        if let Some(first) = history.first().map(|d| d.date) {
            for attempt in record.attempts.iter().filter(|a| a.success) {
                let day = attempt.created_at.date_naive();
                if day < first || day > today {
                    continue;
                }
                let index = (day - first).num_days() as usize;
                if let Some(slot) = history.get_mut(index) {
                    slot.successful_sessions += 1;
                    slot.active = true;
                }
            }
        }

        let active_days = history.iter().filter(|d| d.active).count() as u32;
        Self {
            totals: record.stats.clone(),
            accuracy_percent: record.stats.accuracy_percent(),
            history,
            active_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::learner::Attempt;
    use crate::core::preset::PresetId;
    use crate::core::session::Metrics;

    fn attempt_at(created_at: DateTime<Utc>, success: bool) -> Attempt {
        Attempt {
            learner_id: "ada".to_string(),
            trainer_id: "times-tables".to_string(),
            token: None,
            kind: "drill".to_string(),
            level: PresetId::new("lvl1"),
            success,
            metrics: Metrics::default(),
            created_at,
        }
    }

    #[test]
    fn test_histogram_buckets_by_day() {
        let now = Utc::now();
        let mut record = LearnerRecord::new("ada");
        record.attempts.push(attempt_at(now, true));
        record.attempts.push(attempt_at(now, true));
        record.attempts.push(attempt_at(now, false));
        record
            .attempts
            .push(attempt_at(now - Duration::days(2), true));
        // outside the window
        record
            .attempts
            .push(attempt_at(now - Duration::days(30), true));

        let summary = StatsSummary::build(&record, 7, now);
        assert_eq!(summary.history.len(), 7);
        assert_eq!(summary.history[6].date, now.date_naive());
        assert_eq!(summary.history[6].successful_sessions, 2);
        assert!(summary.history[4].active);
        assert!(!summary.history[5].active);
        assert_eq!(summary.active_days, 2);
    }

    #[test]
    fn test_empty_learner() {
        let summary = StatsSummary::build(&LearnerRecord::new("ada"), 7, Utc::now());
        assert_eq!(summary.active_days, 0);
        assert!(summary.accuracy_percent.is_none());
        assert!(summary.history.iter().all(|d| !d.active));
    }

    #[test]
    fn test_window_is_capped() {
        let summary = StatsSummary::build(&LearnerRecord::new("ada"), 4_000_000_000, Utc::now());
        assert_eq!(summary.history.len(), MAX_HISTORY_DAYS as usize);
    }

    #[test]
    fn test_zero_days() {
        let summary = StatsSummary::build(&LearnerRecord::new("ada"), 0, Utc::now());
        assert!(summary.history.is_empty());
    }
}
