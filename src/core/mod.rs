//! Core types and logic for Abacus.
//!
//! Progress records and their merge rule, presets and lock resolution,
//! session configuration and results, and the per-learner document.

pub mod learner;
pub mod preset;
pub mod progress;
pub mod session;

pub use learner::{validate_learner_id, Attempt, LearnerRecord, MAX_LEARNER_ID_LEN};
pub use preset::{
    LockState, MetricField, Preset, PresetId, PresetKind, PresetView, ProgressRule,
    SessionDefaults, SuccessPolicy, Trainer, UnlockPolicy,
};
pub use progress::{Archetype, LevelProgress, ModeProgress, Progress, ProgressFlag, LEVEL_COUNT};
pub use session::{
    AttemptToken, ConfigOverrides, Metrics, RawOutcome, SessionConfig, SessionResult,
    MAX_PROBLEM_COUNT, MAX_STARS,
};
