//! Level drill trainers (times tables and the like).
//!
//! Levels archetype: three levels of increasing difficulty, each unlocked by
//! passing the previous one, plus a race once level 1 is done. Drills count
//! only the problems actually reached, so an abandoned drill does not inflate
//! the learner's problem totals.

use crate::core::{
    Archetype, MetricField, Metrics, Preset, ProgressFlag, ProgressRule, RawOutcome,
    SessionConfig, SessionDefaults, SessionResult, SuccessPolicy, Trainer, UnlockPolicy,
    LEVEL_COUNT, MAX_STARS,
};
use crate::error::Result;
use crate::trainers::{base_counts, performance_stars, TrainerAdapter};

/// Opponent speed of the drill race, in problems per minute.
pub const DRILL_RACE_PPM: f64 = 15.0;

/// Level drill trainer.
#[derive(Debug, Clone)]
pub struct DrillTrainer {
    trainer: Trainer,
}

impl DrillTrainer {
    pub fn times_tables() -> Self {
        Self::new("times-tables", "Times Tables")
    }

    pub fn new(id: &str, title: &str) -> Self {
        let level_policies = [
            SuccessPolicy::MinAccuracy { percent: 80.0 },
            SuccessPolicy::MinAccuracy { percent: 90.0 },
            SuccessPolicy::All {
                policies: vec![
                    SuccessPolicy::NoMistakes,
                    SuccessPolicy::AtMost {
                        field: MetricField::ElapsedSec,
                        value: 90.0,
                    },
                ],
            },
        ];

        let mut presets: Vec<Preset> = level_policies
            .into_iter()
            .enumerate()
            .map(|(index, policy)| {
                let level = index as u8 + 1;
                let mut defaults = SessionDefaults::problems(10 + 5 * index as u32);
                if level == LEVEL_COUNT {
                    defaults = defaults.with_time_limit(90);
                }
                Preset::new(
                    &format!("lvl{}", level),
                    &format!("Level {}", level),
                    &format!("Pass level {} to move on", level),
                    defaults,
                )
                .with_success(policy)
                .completed_when(ProgressRule::flag(ProgressFlag::Level(level)))
            })
            .collect();

        presets.push(
            Preset::new(
                "race",
                "Race",
                "Outpace the opponent",
                SessionDefaults::problems(20).with_opponent(DRILL_RACE_PPM, 1),
            )
            .with_success(SuccessPolicy::Won)
            .with_unlock(ProgressRule::flag(ProgressFlag::Level(1))),
        );

        Self {
            trainer: Trainer {
                id: id.to_string(),
                title: title.to_string(),
                back_target: "/trainers/drills".to_string(),
                archetype: Archetype::Levels,
                kind: "drill".to_string(),
                presets,
                unlock_policy: UnlockPolicy::Linear {
                    order: Some(vec!["lvl1".into(), "lvl2".into(), "lvl3".into()]),
                },
            },
        }
    }
}

impl TrainerAdapter for DrillTrainer {
    fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    fn interpret(&self, config: &SessionConfig, outcome: &RawOutcome) -> Result<SessionResult> {
        let (total, solved, correct) = base_counts(&self.trainer, config, outcome)?;
        let preset = self.trainer.require_preset(&config.preset_id)?;
        let is_race = config.preset_id.kind().is_race();

        let mut metrics = Metrics {
            total,
            solved,
            correct,
            mistakes: Some(outcome.mistakes),
            elapsed_sec: outcome.elapsed_sec,
            won: is_race.then(|| outcome.won.unwrap_or(false)),
            stars: 0,
            badges: Vec::new(),
        };
        // unfinished drills never pass
        let success = solved == total && preset.is_success(&metrics);

        metrics.stars = match outcome.stars {
            Some(stars) => stars.min(MAX_STARS),
            None if is_race => {
                if metrics.won == Some(true) {
                    performance_stars(true, outcome.mistakes)
                } else {
                    0
                }
            }
            None => performance_stars(success, outcome.mistakes),
        };
        if success && outcome.mistakes == 0 {
            metrics.badges.push("perfect".to_string());
        }
        if metrics.won == Some(true) {
            metrics.badges.push("winner".to_string());
        }

        Ok(SessionResult::new(success, metrics))
    }

    /// Record only the problems reached. Mistakes of an unfinished drill are
    /// not tracked, so it never counts as a perfect session.
    fn attempt_metrics(&self, result: &SessionResult) -> Metrics {
        let mut metrics = result.metrics.clone();
        if metrics.solved < metrics.total {
            metrics.mistakes = None;
        }
        metrics.total = metrics.solved;
        metrics.correct = metrics.correct.min(metrics.total);
        metrics
    }
}
