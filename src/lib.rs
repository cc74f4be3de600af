//! Abacus - Trainer Session Progression & Achievement Engine
//!
//! Abacus tracks a learner's mastery across math trainers. Presets unlock
//! along a gating graph, every finished run is recorded exactly once under
//! its attempt token, progress only ever moves forward, and achievements
//! unlock incrementally from a per-learner stats snapshot.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod flow;
pub mod recording;
pub mod stats;
pub mod storage;
pub mod trainers;
pub mod util;

pub use config::Config;
pub use core::{
    Archetype, AttemptToken, LearnerRecord, Preset, PresetId, Progress, RawOutcome,
    SessionConfig, SessionResult, Trainer,
};
pub use error::{AbacusError, Result};
pub use flow::{CachedProgressApi, ProgressCache, SessionClock, SessionFlow, Stage};
pub use recording::{ProgressApi, RecordOutcome, RecordRequest, Recorder};
pub use stats::{AchievementView, StatsSummary, UserStats};
pub use storage::{FileLearnerStore, LearnerStore, MemoryLearnerStore};
pub use trainers::{TrainerAdapter, TrainerRegistry};

// CLI commands
pub use cli::{
    AchievementsCommand, PlayCommand, ProgressCommand, RecordCommand, StatsCommand,
    TrainersCommand,
};
