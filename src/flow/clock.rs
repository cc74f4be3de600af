//! Session clock for timed and race sub-modes.
//!
//! The clock is armed for one attempt token. Ticks carrying any other token
//! are dropped, and a cancelled clock ignores everything until it is armed
//! again, so a finished run can never leak ticks into the next one.

use serde::Serialize;

use crate::core::{AttemptToken, SessionConfig};

/// Snapshot produced by one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockTick {
    pub elapsed_sec: f64,
    /// Seconds left on a countdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_sec: Option<f64>,
    /// Problems the simulated opponent has finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_solved: Option<u32>,
    /// Countdown reached zero.
    pub expired: bool,
    /// Opponent finished the whole sheet.
    pub opponent_finished: bool,
}

/// Cancellable countdown plus opponent simulation.
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    token: Option<AttemptToken>,
    time_limit_sec: Option<u32>,
    opponent_ppm: Option<f64>,
    problem_count: u32,
    elapsed_sec: f64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the clock for a run. Replaces any previous run.
    pub fn start(&mut self, config: &SessionConfig) {
        self.token = Some(config.token.clone());
        self.time_limit_sec = config.time_limit_sec;
        self.opponent_ppm = config.opponent_ppm;
        self.problem_count = config.problem_count;
        self.elapsed_sec = 0.0;
    }

    /// Disarm the clock.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            tracing::trace!(token = %token, "session clock cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.token.is_some()
    }

    pub fn elapsed_sec(&self) -> f64 {
        self.elapsed_sec
    }

    /// Whether the clock drives anything for this config.
    pub fn is_needed(config: &SessionConfig) -> bool {
        config.time_limit_sec.is_some() || config.opponent_ppm.is_some()
    }

    /// Advance by `dt_sec`. Returns `None` for a stale token or a stopped
    /// clock. The clock stops itself once time runs out or the opponent
    /// finishes.
    pub fn tick(&mut self, token: &AttemptToken, dt_sec: f64) -> Option<ClockTick> {
        if self.token.as_ref() != Some(token) {
            return None;
        }
        if dt_sec.is_finite() && dt_sec > 0.0 {
            self.elapsed_sec += dt_sec;
        }

        let remaining_sec = self
            .time_limit_sec
            .map(|limit| (f64::from(limit) - self.elapsed_sec).max(0.0));
        let opponent_solved = self.opponent_ppm.map(|ppm| {
            let solved = (ppm * self.elapsed_sec / 60.0).floor();
            (solved as u32).min(self.problem_count)
        });

        let expired = remaining_sec == Some(0.0);
        let opponent_finished = opponent_solved.is_some_and(|n| n >= self.problem_count);
        if expired || opponent_finished {
            self.cancel();
        }

        Some(ClockTick {
            elapsed_sec: self.elapsed_sec,
            remaining_sec,
            opponent_solved,
            expired,
            opponent_finished,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PresetId, SessionDefaults};

    fn timed() -> SessionConfig {
        SessionConfig::from_defaults(
            PresetId::new("speed"),
            &SessionDefaults::problems(10).with_time_limit(10),
        )
    }

    fn race() -> SessionConfig {
        SessionConfig::from_defaults(
            PresetId::new("race:1"),
            &SessionDefaults::problems(3).with_opponent(6.0, 1),
        )
    }

    #[test]
    fn test_countdown_expires_and_stops() {
        let config = timed();
        let mut clock = SessionClock::new();
        clock.start(&config);

        let tick = clock.tick(&config.token, 4.0).unwrap();
        assert_eq!(tick.remaining_sec, Some(6.0));
        assert!(!tick.expired);

        let tick = clock.tick(&config.token, 7.0).unwrap();
        assert_eq!(tick.remaining_sec, Some(0.0));
        assert!(tick.expired);
        assert!(!clock.is_running());
        assert!(clock.tick(&config.token, 1.0).is_none());
    }

    #[test]
    fn test_opponent_progress() {
        let config = race();
        let mut clock = SessionClock::new();
        clock.start(&config);

        // 6 per minute: one problem every 10 seconds
        let tick = clock.tick(&config.token, 15.0).unwrap();
        assert_eq!(tick.opponent_solved, Some(1));
        assert!(tick.remaining_sec.is_none());

        let tick = clock.tick(&config.token, 20.0).unwrap();
        assert_eq!(tick.opponent_solved, Some(3));
        assert!(tick.opponent_finished);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_stale_token_ignored() {
        let first = timed();
        let second = first.with_fresh_token();
        let mut clock = SessionClock::new();
        clock.start(&first);
        clock.start(&second);

        assert!(clock.tick(&first.token, 1.0).is_none());
        assert!(clock.tick(&second.token, 1.0).is_some());
    }

    #[test]
    fn test_cancel_and_bad_dt() {
        let config = timed();
        let mut clock = SessionClock::new();
        clock.start(&config);
        clock.tick(&config.token, f64::NAN);
        clock.tick(&config.token, -3.0);
        assert_eq!(clock.elapsed_sec(), 0.0);

        clock.cancel();
        assert!(clock.tick(&config.token, 1.0).is_none());
        assert!(SessionClock::is_needed(&config));
    }
}
