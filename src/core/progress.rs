//! Per-trainer progress records.
//!
//! Progress is a tagged variant, one case per trainer archetype. Every field
//! only moves toward "more unlocked": flags flip false to true, race stars
//! only increase. All mutation goes through [`Progress::apply`] and
//! [`Progress::merge`], both of which preserve that invariant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::preset::PresetKind;
use crate::core::session::{SessionResult, MAX_STARS};

/// Shape of a trainer's progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// `{accuracy, speed, race_stars}` (column arithmetic).
    Modes,
    /// `{lvl1, lvl2, lvl3, race_stars}` (level drills).
    Levels,
}

/// Mastery record for trainers with accuracy / speed / race modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeProgress {
    pub accuracy: bool,
    pub speed: bool,
    pub race_stars: u8,
}

/// Mastery record for trainers with numbered levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelProgress {
    pub lvl1: bool,
    pub lvl2: bool,
    pub lvl3: bool,
    pub race_stars: u8,
}

/// Number of levels a level trainer carries.
pub const LEVEL_COUNT: u8 = 3;

/// A boolean mastery flag addressable by unlock rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressFlag {
    Accuracy,
    Speed,
    Level(u8),
}

impl fmt::Display for ProgressFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accuracy => write!(f, "accuracy"),
            Self::Speed => write!(f, "speed"),
            Self::Level(n) => write!(f, "level {}", n),
        }
    }
}

/// Progress of one learner on one trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "archetype", rename_all = "snake_case")]
pub enum Progress {
    Modes(ModeProgress),
    Levels(LevelProgress),
}

impl Progress {
    /// All-false / zero record for an archetype.
    pub fn default_for(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Modes => Self::Modes(ModeProgress::default()),
            Archetype::Levels => Self::Levels(LevelProgress::default()),
        }
    }

    /// The archetype this record belongs to.
    pub fn archetype(&self) -> Archetype {
        match self {
            Self::Modes(_) => Archetype::Modes,
            Self::Levels(_) => Archetype::Levels,
        }
    }

    /// Coerce a stored record to the trainer's archetype.
    ///
    /// A record of the wrong shape is replaced by the trainer defaults rather
    /// than failing the session. Out-of-range stars are clamped.
    pub fn normalize(self, archetype: Archetype) -> Self {
        if self.archetype() != archetype {
            tracing::warn!(
                expected = ?archetype,
                found = ?self.archetype(),
                "progress shape mismatch, resetting to trainer defaults"
            );
            return Self::default_for(archetype);
        }
        match self {
            Self::Modes(mut p) => {
                p.race_stars = p.race_stars.min(MAX_STARS);
                Self::Modes(p)
            }
            Self::Levels(mut p) => {
                p.race_stars = p.race_stars.min(MAX_STARS);
                Self::Levels(p)
            }
        }
    }

    /// Read a mastery flag. Flags the archetype lacks read as false.
    pub fn flag(&self, flag: ProgressFlag) -> bool {
        match (self, flag) {
            (Self::Modes(p), ProgressFlag::Accuracy) => p.accuracy,
            (Self::Modes(p), ProgressFlag::Speed) => p.speed,
            (Self::Levels(p), ProgressFlag::Level(1)) => p.lvl1,
            (Self::Levels(p), ProgressFlag::Level(2)) => p.lvl2,
            (Self::Levels(p), ProgressFlag::Level(3)) => p.lvl3,
            _ => false,
        }
    }

    /// Best race result so far.
    pub fn race_stars(&self) -> u8 {
        match self {
            Self::Modes(p) => p.race_stars,
            Self::Levels(p) => p.race_stars,
        }
    }

    /// Apply one session's outcome under this archetype's merge rule.
    ///
    /// Returns whether anything changed. Non-progressing presets (training,
    /// custom) never touch the record.
    pub fn apply(&mut self, kind: &PresetKind, result: &SessionResult) -> bool {
        let before = *self;
        match (&mut *self, kind) {
            (Self::Modes(p), PresetKind::Accuracy) => {
                if result.metrics.is_perfect() {
                    p.accuracy = true;
                }
            }
            (Self::Modes(p), PresetKind::Speed) => {
                if result.success {
                    p.speed = true;
                }
            }
            (Self::Levels(p), PresetKind::Level(n)) => {
                if result.success {
                    match *n {
                        1 => p.lvl1 = true,
                        2 => p.lvl2 = true,
                        3 => p.lvl3 = true,
                        _ => {}
                    }
                }
            }
            (Self::Modes(ModeProgress { race_stars, .. }), PresetKind::Race(_))
            | (Self::Levels(LevelProgress { race_stars, .. }), PresetKind::Race(_)) => {
                let earned = result.metrics.stars.min(MAX_STARS);
                *race_stars = (*race_stars).max(earned);
            }
            _ => {}
        }
        *self != before
    }

    /// Least upper bound of two records of the same archetype.
    ///
    /// Used to fold a server response into a cached copy without ever
    /// regressing. Records of different shapes resolve to `other`.
    pub fn merge(&self, other: &Progress) -> Progress {
        match (self, other) {
            (Self::Modes(a), Self::Modes(b)) => Self::Modes(ModeProgress {
                accuracy: a.accuracy || b.accuracy,
                speed: a.speed || b.speed,
                race_stars: a.race_stars.max(b.race_stars),
            }),
            (Self::Levels(a), Self::Levels(b)) => Self::Levels(LevelProgress {
                lvl1: a.lvl1 || b.lvl1,
                lvl2: a.lvl2 || b.lvl2,
                lvl3: a.lvl3 || b.lvl3,
                race_stars: a.race_stars.max(b.race_stars),
            }),
            _ => *other,
        }
    }

    /// Whether `self` is at least as unlocked as `other` in every field.
    pub fn dominates(&self, other: &Progress) -> bool {
        self.merge(other) == *self
    }
}
