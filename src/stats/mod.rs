//! Stats and achievements for Abacus.
//!
//! The per-learner snapshot is the source of truth for totals; it moves
//! forward one attempt delta at a time. Achievements are evaluated from the
//! snapshot before and after each delta, never by rescanning history.

pub mod achievements;
pub mod snapshot;
pub mod summary;

pub use achievements::{
    catalog, evaluate as evaluate_achievements, project as project_achievements,
    AchievementDefinition, AchievementKind, AchievementState, AchievementView, Evaluation,
    UnlockedAchievement,
};
pub use snapshot::{StatField, StatsDelta, UserStats};
pub use summary::{DaySuccess, StatsSummary};
