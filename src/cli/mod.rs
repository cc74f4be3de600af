//! CLI commands for Abacus.
//!
//! Each command takes a [`ProgressApi`](crate::recording::ProgressApi) and
//! renders its output as text, JSON, or nothing (`--quiet`):
//! - **Read commands**: trainers, progress, achievements, stats
//! - **Write commands**: record, play

// Read commands
pub mod achievements;
pub mod progress;
pub mod stats;
pub mod trainers;

// Write commands
pub mod play;
pub mod record;

pub use achievements::AchievementsCommand;
pub use play::PlayCommand;
pub use progress::ProgressCommand;
pub use record::RecordCommand;
pub use stats::StatsCommand;
pub use trainers::TrainersCommand;
