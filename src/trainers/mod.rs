//! Trainer adapters for Abacus.
//!
//! Each trainer archetype supplies its preset list, its unlock policy, the
//! mapping from a raw exercise outcome to a `SessionResult`, and the shape of
//! the metrics it records. The flow and the recorder only ever talk to
//! [`TrainerAdapter`].
//!
//! Built-in trainers:
//! - **column-addition / column-subtraction**: accuracy, speed and race modes
//! - **times-tables**: three levels plus a race

pub mod column;
pub mod drill;
pub mod registry;

pub use column::ColumnTrainer;
pub use drill::DrillTrainer;
pub use registry::TrainerRegistry;

use crate::core::{Metrics, RawOutcome, SessionConfig, SessionResult, Trainer};
use crate::error::{AbacusError, Result};

/// Interface every trainer archetype implements.
pub trait TrainerAdapter: Send + Sync {
    /// Static description: presets, archetype, unlock policy.
    fn trainer(&self) -> &Trainer;

    /// Turn the runner's terminal outcome into a canonical result.
    fn interpret(&self, config: &SessionConfig, outcome: &RawOutcome) -> Result<SessionResult>;

    /// Metrics written to the ledger and fed to the stats delta.
    ///
    /// Default records the result's metrics unchanged.
    fn attempt_metrics(&self, result: &SessionResult) -> Metrics {
        result.metrics.clone()
    }

    /// Trainer id.
    fn id(&self) -> &str {
        &self.trainer().id
    }

    /// Recording kind.
    fn kind(&self) -> &str {
        &self.trainer().kind
    }
}

/// Counts shared by every adapter: problem total, solved, correct.
///
/// A zero outcome total means the configured count. Solved is clamped to the
/// total, correct to solved.
pub(crate) fn base_counts(
    trainer: &Trainer,
    config: &SessionConfig,
    outcome: &RawOutcome,
) -> Result<(u32, u32, u32)> {
    trainer.require_preset(&config.preset_id)?;
    if !outcome.elapsed_sec.is_finite() || outcome.elapsed_sec < 0.0 {
        return Err(AbacusError::validation(
            "elapsed seconds must be a non-negative number",
        ));
    }
    let total = if outcome.total == 0 {
        config.problem_count
    } else {
        outcome.total
    };
    let solved = outcome.solved.min(total);
    let correct = solved.saturating_sub(outcome.mistakes);
    Ok((total, solved, correct))
}

/// Stars for a non-race run: 3 for flawless, 2 for at most two slips, 1 for
/// any other success.
pub(crate) fn performance_stars(success: bool, mistakes: u32) -> u8 {
    match (success, mistakes) {
        (false, _) => 0,
        (true, 0) => 3,
        (true, 1..=2) => 2,
        (true, _) => 1,
    }
}
