//! Session configuration and outcome types.
//!
//! A `SessionConfig` is frozen when a run starts and always carries a fresh
//! `AttemptToken`. The exercise runner answers with a `RawOutcome`, which the
//! trainer adapter turns into a `SessionResult`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::preset::{PresetId, SessionDefaults};
use crate::error::{AbacusError, Result};

/// Largest problem count a single session may ask for.
pub const MAX_PROBLEM_COUNT: u32 = 200;

/// Highest star rating of a race.
pub const MAX_STARS: u8 = 3;

/// Opaque per-run identifier used to deduplicate recordings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptToken(String);

impl AttemptToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a token received from a client.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AbacusError::validation("attempt token must not be empty"));
        }
        if trimmed.len() > 128 {
            return Err(AbacusError::validation(
                "attempt token must be at most 128 characters",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttemptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Frozen parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Preset being played.
    pub preset_id: PresetId,
    /// Fresh token for this run.
    pub token: AttemptToken,
    /// Number of problems to pose.
    pub problem_count: u32,
    /// Countdown for timed presets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_sec: Option<u32>,
    /// Simulated opponent speed in problems per minute (race presets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_ppm: Option<f64>,
    /// Star level the run is played at (race presets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star_level: Option<u8>,
}

impl SessionConfig {
    /// Snapshot a preset's defaults into a config with a new token.
    pub fn from_defaults(preset_id: PresetId, defaults: &SessionDefaults) -> Self {
        Self {
            preset_id,
            token: AttemptToken::generate(),
            problem_count: defaults.problem_count,
            time_limit_sec: defaults.time_limit_sec,
            opponent_ppm: defaults.opponent_ppm,
            star_level: defaults.star_level,
        }
    }

    /// Copy of this config for another run. Tokens are never reused.
    pub fn with_fresh_token(&self) -> Self {
        Self {
            token: AttemptToken::generate(),
            ..self.clone()
        }
    }

    /// Apply advanced overrides. The result carries a fresh token.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Result<Self> {
        let mut next = self.with_fresh_token();
        if let Some(count) = overrides.problem_count {
            next.problem_count = count;
        }
        if let Some(limit) = overrides.time_limit_sec {
            next.time_limit_sec = Some(limit);
        }
        if let Some(ppm) = overrides.opponent_ppm {
            next.opponent_ppm = Some(ppm);
        }
        next.validate()?;
        Ok(next)
    }

    /// Reject malformed or out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        if self.problem_count == 0 || self.problem_count > MAX_PROBLEM_COUNT {
            return Err(AbacusError::validation(format!(
                "problem count must be in 1..={}, got {}",
                MAX_PROBLEM_COUNT, self.problem_count
            )));
        }
        if self.time_limit_sec == Some(0) {
            return Err(AbacusError::validation("time limit must be positive"));
        }
        if let Some(ppm) = self.opponent_ppm {
            if !ppm.is_finite() || ppm <= 0.0 {
                return Err(AbacusError::validation(
                    "opponent speed must be a positive number",
                ));
            }
        }
        if let Some(level) = self.star_level {
            if level > MAX_STARS {
                return Err(AbacusError::validation(format!(
                    "star level must be at most {}",
                    MAX_STARS
                )));
            }
        }
        Ok(())
    }
}

/// Optional "advanced" overrides chosen on the select screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub problem_count: Option<u32>,
    pub time_limit_sec: Option<u32>,
    pub opponent_ppm: Option<f64>,
}

/// Metrics bag of one finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Problems posed.
    pub total: u32,
    /// Problems finished.
    pub solved: u32,
    /// Problems answered correctly.
    pub correct: u32,
    /// Mistakes made, when the exercise tracks them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mistakes: Option<u32>,
    /// Wall time of the run.
    pub elapsed_sec: f64,
    /// Race outcome, when the run was a race.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub won: Option<bool>,
    /// Stars earned (0-3).
    #[serde(default)]
    pub stars: u8,
    /// Free-form labels for the result screen.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
}

impl Metrics {
    /// Reject malformed metrics before anything is recorded.
    pub fn validate(&self) -> Result<()> {
        if !self.elapsed_sec.is_finite() || self.elapsed_sec < 0.0 {
            return Err(AbacusError::validation(
                "elapsed seconds must be a non-negative number",
            ));
        }
        if self.stars > MAX_STARS {
            return Err(AbacusError::validation(format!(
                "stars must be at most {}, got {}",
                MAX_STARS, self.stars
            )));
        }
        if self.solved > self.total {
            return Err(AbacusError::validation(format!(
                "solved ({}) exceeds total ({})",
                self.solved, self.total
            )));
        }
        Ok(())
    }

    /// Correct answers clamped to `[0, total]`.
    pub fn clamped_correct(&self) -> u32 {
        self.correct.min(self.total)
    }

    /// Share of correct answers in percent, `None` for an empty run.
    pub fn accuracy_percent(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.clamped_correct() as f64 * 100.0 / self.total as f64)
    }

    /// Whether the run finished every problem without a mistake.
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.mistakes == Some(0)
    }
}

/// Outcome of one run, consumed once by the recording protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub success: bool,
    pub metrics: Metrics,
}

impl SessionResult {
    pub fn new(success: bool, metrics: Metrics) -> Self {
        Self { success, metrics }
    }
}

/// Terminal outcome reported by an exercise runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutcome {
    pub solved: u32,
    /// Problems posed; `0` means "use the configured problem count".
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub mistakes: u32,
    pub elapsed_sec: f64,
    #[serde(default)]
    pub won: Option<bool>,
    #[serde(default)]
    pub stars: Option<u8>,
}

impl RawOutcome {
    /// An abandoned or crashed run still resolves to a terminal outcome.
    pub fn abandoned(elapsed_sec: f64) -> Self {
        Self {
            elapsed_sec,
            ..Default::default()
        }
    }
}
