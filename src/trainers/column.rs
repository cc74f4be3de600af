//! Column arithmetic trainers.
//!
//! Modes archetype: a free training sheet, an accuracy sheet (no mistakes),
//! a timed speed sheet, and three races against an opponent of increasing
//! speed. Training, accuracy and speed are gated linearly; races add their
//! own star thresholds on top.

use crate::core::{
    Archetype, MetricField, Metrics, Preset, ProgressFlag, ProgressRule, RawOutcome,
    SessionConfig, SessionDefaults, SessionResult, SuccessPolicy, Trainer, UnlockPolicy,
    MAX_STARS,
};
use crate::error::Result;
use crate::trainers::{base_counts, performance_stars, TrainerAdapter};

/// Speed sheet time limit in seconds.
pub const SPEED_TIME_LIMIT_SEC: u32 = 120;

/// Opponent speeds for race levels 1-3, in problems per minute.
pub const RACE_OPPONENT_PPM: [f64; 3] = [6.0, 9.0, 12.0];

/// Column addition / subtraction trainer.
#[derive(Debug, Clone)]
pub struct ColumnTrainer {
    trainer: Trainer,
}

impl ColumnTrainer {
    pub fn addition() -> Self {
        Self::new("column-addition", "Column Addition")
    }

    pub fn subtraction() -> Self {
        Self::new("column-subtraction", "Column Subtraction")
    }

    /// Build a column trainer with the standard preset ladder.
    pub fn new(id: &str, title: &str) -> Self {
        let mut presets = vec![
            Preset::new(
                "training",
                "Training",
                "Practice at your own pace",
                SessionDefaults::problems(5),
            ),
            Preset::new(
                "accuracy",
                "Accuracy",
                "Solve every problem without a mistake",
                SessionDefaults::problems(10),
            )
            .with_success(SuccessPolicy::NoMistakes)
            .completed_when(ProgressRule::flag(ProgressFlag::Accuracy)),
            Preset::new(
                "speed",
                "Speed",
                "Beat the clock with at least 80% accuracy",
                SessionDefaults::problems(10).with_time_limit(SPEED_TIME_LIMIT_SEC),
            )
            .with_success(SuccessPolicy::All {
                policies: vec![
                    SuccessPolicy::MinAccuracy { percent: 80.0 },
                    SuccessPolicy::AtMost {
                        field: MetricField::ElapsedSec,
                        value: f64::from(SPEED_TIME_LIMIT_SEC),
                    },
                ],
            })
            .completed_when(ProgressRule::flag(ProgressFlag::Speed)),
        ];

        for (index, ppm) in RACE_OPPONENT_PPM.iter().enumerate() {
            let level = index as u8 + 1;
            let unlock = if level == 1 {
                ProgressRule::flag(ProgressFlag::Speed)
            } else {
                ProgressRule::all_of(vec![
                    ProgressRule::flag(ProgressFlag::Speed),
                    ProgressRule::min_race_stars(level - 1),
                ])
            };
            presets.push(
                Preset::new(
                    &format!("race:{}", level),
                    &format!("Race {}", level),
                    &format!("Finish before an opponent solving {} per minute", ppm),
                    SessionDefaults::problems(10).with_opponent(*ppm, level),
                )
                .with_success(SuccessPolicy::Won)
                .with_unlock(unlock)
                .completed_when(ProgressRule::min_race_stars(level)),
            );
        }

        Self {
            trainer: Trainer {
                id: id.to_string(),
                title: title.to_string(),
                back_target: "/trainers/column".to_string(),
                archetype: Archetype::Modes,
                kind: "column".to_string(),
                presets,
                unlock_policy: UnlockPolicy::Linear {
                    order: Some(vec!["training".into(), "accuracy".into(), "speed".into()]),
                },
            },
        }
    }
}

impl TrainerAdapter for ColumnTrainer {
    fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    fn interpret(&self, config: &SessionConfig, outcome: &RawOutcome) -> Result<SessionResult> {
        let (total, solved, correct) = base_counts(&self.trainer, config, outcome)?;
        let preset = self.trainer.require_preset(&config.preset_id)?;
        let is_race = config.preset_id.kind().is_race();
        // problems left on the sheet count against it
        let mistakes = outcome.mistakes.saturating_add(total - solved);

        let mut metrics = Metrics {
            total,
            solved,
            correct,
            mistakes: Some(mistakes),
            elapsed_sec: outcome.elapsed_sec,
            won: is_race.then(|| outcome.won.unwrap_or(false)),
            stars: 0,
            badges: Vec::new(),
        };
        let success = preset.is_success(&metrics);

        metrics.stars = match (is_race, outcome.stars) {
            (_, Some(stars)) => stars.min(MAX_STARS),
            // winning race N earns N stars
            (true, None) if metrics.won == Some(true) => {
                config.star_level.unwrap_or(1).min(MAX_STARS)
            }
            (true, None) => 0,
            (false, None) => performance_stars(success, mistakes),
        };

        if metrics.is_perfect() {
            metrics.badges.push("perfect".to_string());
        }
        if let Some(limit) = config.time_limit_sec {
            if success && metrics.elapsed_sec <= f64::from(limit) / 2.0 {
                metrics.badges.push("fast".to_string());
            }
        }
        if metrics.won == Some(true) {
            metrics.badges.push("winner".to_string());
        }

        tracing::debug!(
            trainer = %self.trainer.id,
            preset = %config.preset_id,
            success,
            stars = metrics.stars,
            "interpreted column outcome"
        );
        Ok(SessionResult::new(success, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ModeProgress, PresetId, Progress};

    fn config(trainer: &ColumnTrainer, preset: &str) -> SessionConfig {
        let preset = trainer.trainer().preset(&PresetId::new(preset)).unwrap();
        SessionConfig::from_defaults(preset.id.clone(), &preset.defaults)
    }

    fn outcome(solved: u32, mistakes: u32, secs: f64) -> RawOutcome {
        RawOutcome {
            solved,
            total: 0,
            mistakes,
            elapsed_sec: secs,
            won: None,
            stars: None,
        }
    }

    #[test]
    fn test_race_two_locked_on_empty_progress() {
        let trainer = ColumnTrainer::addition();
        let empty = Progress::Modes(ModeProgress::default());
        let state = trainer
            .trainer()
            .lock_state(&PresetId::new("race:2"), Some(&empty))
            .unwrap();
        assert!(state.locked);
        // speed is itself linearly gated; the reason names what is missing
        let reason = state.reason.unwrap();
        assert!(reason.contains("speed"), "reason was: {}", reason);

        let speed_only = Progress::Modes(ModeProgress {
            accuracy: true,
            speed: true,
            race_stars: 0,
        });
        let state = trainer
            .trainer()
            .lock_state(&PresetId::new("race:2"), Some(&speed_only))
            .unwrap();
        assert!(state.locked);
        assert!(state.reason.unwrap().contains("race star"));

        let with_star = Progress::Modes(ModeProgress {
            accuracy: true,
            speed: true,
            race_stars: 1,
        });
        assert!(!trainer
            .trainer()
            .is_locked(&PresetId::new("race:2"), &with_star));
    }

    #[test]
    fn test_linear_ladder() {
        let trainer = ColumnTrainer::subtraction();
        let empty = Progress::Modes(ModeProgress::default());
        let t = trainer.trainer();
        assert!(!t.is_locked(&"training".into(), &empty));
        assert!(!t.is_locked(&"accuracy".into(), &empty));
        assert!(t.is_locked(&"speed".into(), &empty));
        assert!(t.is_locked(&"race:1".into(), &empty));
    }

    #[test]
    fn test_accuracy_success_needs_no_mistakes() {
        let trainer = ColumnTrainer::addition();
        let cfg = config(&trainer, "accuracy");

        let clean = trainer.interpret(&cfg, &outcome(10, 0, 40.0)).unwrap();
        assert!(clean.success);
        assert_eq!(clean.metrics.total, 10);
        assert_eq!(clean.metrics.stars, 3);
        assert!(clean.metrics.badges.contains(&"perfect".to_string()));

        let sloppy = trainer.interpret(&cfg, &outcome(10, 1, 40.0)).unwrap();
        assert!(!sloppy.success);
        assert_eq!(sloppy.metrics.correct, 9);
        assert_eq!(sloppy.metrics.stars, 0);
    }

    #[test]
    fn test_speed_respects_time_limit() {
        let trainer = ColumnTrainer::addition();
        let cfg = config(&trainer, "speed");

        let quick = trainer.interpret(&cfg, &outcome(10, 1, 50.0)).unwrap();
        assert!(quick.success);
        assert!(quick.metrics.badges.contains(&"fast".to_string()));

        let slow = trainer.interpret(&cfg, &outcome(10, 0, 130.0)).unwrap();
        assert!(!slow.success);
    }

    #[test]
    fn test_race_stars_follow_level() {
        let trainer = ColumnTrainer::addition();
        let cfg = config(&trainer, "race:2");
        assert_eq!(cfg.opponent_ppm, Some(9.0));

        let mut won = outcome(10, 3, 60.0);
        won.won = Some(true);
        let result = trainer.interpret(&cfg, &won).unwrap();
        assert!(result.success);
        assert_eq!(result.metrics.stars, 2);
        assert!(result.metrics.badges.contains(&"winner".to_string()));

        let lost = trainer.interpret(&cfg, &outcome(6, 0, 60.0)).unwrap();
        assert!(!lost.success);
        assert_eq!(lost.metrics.won, Some(false));
        assert_eq!(lost.metrics.stars, 0);
    }

    #[test]
    fn test_abandoned_run_resolves() {
        let trainer = ColumnTrainer::addition();
        let cfg = config(&trainer, "speed");
        let result = trainer
            .interpret(&cfg, &RawOutcome::abandoned(12.0))
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.metrics.solved, 0);
        assert_eq!(result.metrics.mistakes, Some(10));
        assert!(!result.metrics.is_perfect());
        assert!(result.metrics.validate().is_ok());
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let trainer = ColumnTrainer::addition();
        let mut cfg = config(&trainer, "training");
        cfg.preset_id = PresetId::new("lvl1");
        assert!(trainer.interpret(&cfg, &outcome(1, 0, 1.0)).is_err());
    }
}
