//! Achievement catalog and evaluator.
//!
//! [`evaluate`] is a pure function of the catalog, the previous states and
//! the snapshot before/after one attempt. Unlocked achievements are never
//! re-evaluated, so an unlock timestamp is stable once written.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::snapshot::{StatField, UserStats};

/// How an achievement is earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementKind {
    /// Unlocks when `signal` reaches `total`.
    Counter { total: u64, signal: StatField },
    /// Unlocks the first time `field` strictly increases.
    Boolean { field: StatField },
}

impl AchievementKind {
    /// Target value shown to the learner.
    pub fn total(&self) -> u64 {
        match self {
            Self::Counter { total, .. } => *total,
            Self::Boolean { .. } => 1,
        }
    }
}

/// Catalog entry. Ids are stable forever.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub kind: AchievementKind,
}

const CATALOG: &[AchievementDefinition] = &[
    AchievementDefinition {
        id: "first_steps",
        title: "First Steps",
        description: "Finish your first session",
        icon: "footprints",
        kind: AchievementKind::Counter {
            total: 1,
            signal: StatField::SessionsCount,
        },
    },
    AchievementDefinition {
        id: "problems_10",
        title: "Warming Up",
        description: "Work through 10 problems",
        icon: "spark",
        kind: AchievementKind::Counter {
            total: 10,
            signal: StatField::TotalProblems,
        },
    },
    AchievementDefinition {
        id: "problems_100",
        title: "Century",
        description: "Work through 100 problems",
        icon: "medal",
        kind: AchievementKind::Counter {
            total: 100,
            signal: StatField::TotalProblems,
        },
    },
    AchievementDefinition {
        id: "problems_1000",
        title: "Number Cruncher",
        description: "Work through 1000 problems",
        icon: "trophy",
        kind: AchievementKind::Counter {
            total: 1000,
            signal: StatField::TotalProblems,
        },
    },
    AchievementDefinition {
        id: "perfect_session",
        title: "Flawless",
        description: "Finish a session without a single mistake",
        icon: "diamond",
        kind: AchievementKind::Boolean {
            field: StatField::PerfectSessionsCount,
        },
    },
    AchievementDefinition {
        id: "first_race_win",
        title: "Photo Finish",
        description: "Win your first race",
        icon: "flag",
        kind: AchievementKind::Boolean {
            field: StatField::RaceWinsCount,
        },
    },
    AchievementDefinition {
        id: "race_wins_10",
        title: "Racer",
        description: "Win 10 races",
        icon: "rocket",
        kind: AchievementKind::Counter {
            total: 10,
            signal: StatField::RaceWinsCount,
        },
    },
    AchievementDefinition {
        id: "time_1h",
        title: "Dedicated",
        description: "Train for a full hour in total",
        icon: "hourglass",
        kind: AchievementKind::Counter {
            total: 3600,
            signal: StatField::TotalTimeSec,
        },
    },
];

/// The built-in catalog, in display order.
pub fn catalog() -> &'static [AchievementDefinition] {
    CATALOG
}

/// Per-learner state of one achievement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementState {
    pub progress: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl AchievementState {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// An achievement unlocked by the attempt just recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Result of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Entries whose progress or unlock timestamp changed; the only ones a
    /// caller needs to persist.
    pub changed: BTreeMap<String, AchievementState>,
    pub newly_unlocked: Vec<UnlockedAchievement>,
}

/// Evaluate the catalog for one attempt.
pub fn evaluate(
    catalog: &[AchievementDefinition],
    previous: &BTreeMap<String, AchievementState>,
    before: &UserStats,
    after: &UserStats,
    now: DateTime<Utc>,
) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for definition in catalog {
        let prev = previous.get(definition.id).cloned().unwrap_or_default();
        if prev.is_unlocked() {
            continue;
        }

        let (progress, unlocked) = match definition.kind {
            AchievementKind::Counter { total, signal } => {
                let value = after.get(signal).min(total);
                (value, value >= total)
            }
            AchievementKind::Boolean { field } => {
                let increased = after.get(field) > before.get(field);
                (u64::from(increased), increased)
            }
        };

        let next = AchievementState {
            progress,
            unlocked_at: unlocked.then_some(now),
        };
        if next == prev {
            continue;
        }

        if unlocked {
            evaluation.newly_unlocked.push(UnlockedAchievement {
                id: definition.id.to_string(),
                title: definition.title.to_string(),
                description: definition.description.to_string(),
                icon: definition.icon.to_string(),
                unlocked_at: now,
            });
        }
        evaluation.changed.insert(definition.id.to_string(), next);
    }

    evaluation
}

/// Catalog entry joined with a learner's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub kind: AchievementKind,
    pub total: u64,
    pub progress: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Project catalog × states, in catalog order.
pub fn project(
    catalog: &[AchievementDefinition],
    states: &BTreeMap<String, AchievementState>,
) -> Vec<AchievementView> {
    catalog
        .iter()
        .map(|definition| {
            let state = states.get(definition.id).cloned().unwrap_or_default();
            AchievementView {
                id: definition.id.to_string(),
                title: definition.title.to_string(),
                description: definition.description.to_string(),
                icon: definition.icon.to_string(),
                kind: definition.kind,
                total: definition.kind.total(),
                progress: state.progress,
                unlocked_at: state.unlocked_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn stats_with_problems(n: u64) -> UserStats {
        UserStats {
            total_problems: n,
            sessions_count: 1,
            ..Default::default()
        }
    }

    fn ten_problems() -> Vec<AchievementDefinition> {
        vec![AchievementDefinition {
            id: "problems_10",
            title: "t",
            description: "d",
            icon: "i",
            kind: AchievementKind::Counter {
                total: 10,
                signal: StatField::TotalProblems,
            },
        }]
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = catalog().iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn test_counter_unlocks_at_threshold_and_stays() {
        let defs = ten_problems();
        let t0 = Utc::now();

        let first = evaluate(
            &defs,
            &BTreeMap::new(),
            &UserStats::default(),
            &stats_with_problems(6),
            t0,
        );
        assert!(first.newly_unlocked.is_empty());
        assert_eq!(first.changed["problems_10"].progress, 6);

        let mut states = first.changed;
        let second = evaluate(
            &defs,
            &states,
            &stats_with_problems(6),
            &stats_with_problems(12),
            t0 + Duration::seconds(5),
        );
        assert_eq!(second.newly_unlocked.len(), 1);
        let state = &second.changed["problems_10"];
        assert_eq!(state.progress, 10);
        assert_eq!(state.unlocked_at, Some(t0 + Duration::seconds(5)));
        states.extend(second.changed);

        let third = evaluate(
            &defs,
            &states,
            &stats_with_problems(12),
            &stats_with_problems(40),
            t0 + Duration::seconds(60),
        );
        assert!(third.newly_unlocked.is_empty());
        assert!(third.changed.is_empty());
        assert_eq!(
            states["problems_10"].unlocked_at,
            Some(t0 + Duration::seconds(5))
        );
    }

    #[test]
    fn test_boolean_requires_strict_increase() {
        let defs: Vec<AchievementDefinition> = catalog()
            .iter()
            .filter(|d| d.id == "perfect_session")
            .cloned()
            .collect();
        let before = UserStats {
            perfect_sessions_count: 0,
            ..Default::default()
        };

        let same = evaluate(&defs, &BTreeMap::new(), &before, &before, Utc::now());
        assert!(same.changed.is_empty());

        let after = UserStats {
            perfect_sessions_count: 1,
            ..Default::default()
        };
        let unlocked = evaluate(&defs, &BTreeMap::new(), &before, &after, Utc::now());
        assert_eq!(unlocked.newly_unlocked[0].id, "perfect_session");
    }

    #[test]
    fn test_unchanged_progress_not_reported() {
        let defs = ten_problems();
        let mut states = BTreeMap::new();
        states.insert(
            "problems_10".to_string(),
            AchievementState {
                progress: 4,
                unlocked_at: None,
            },
        );
        let eval = evaluate(
            &defs,
            &states,
            &stats_with_problems(4),
            &stats_with_problems(4),
            Utc::now(),
        );
        assert!(eval.changed.is_empty());
    }

    #[test]
    fn test_project_in_catalog_order() {
        let mut states = BTreeMap::new();
        states.insert(
            "problems_10".to_string(),
            AchievementState {
                progress: 7,
                unlocked_at: None,
            },
        );
        let views = project(catalog(), &states);
        assert_eq!(views.len(), catalog().len());
        assert_eq!(views[0].id, "first_steps");
        let p10 = views.iter().find(|v| v.id == "problems_10").unwrap();
        assert_eq!(p10.progress, 7);
        assert_eq!(p10.total, 10);
        let flawless = views.iter().find(|v| v.id == "perfect_session").unwrap();
        assert_eq!(flawless.total, 1);
    }
}
