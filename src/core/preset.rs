//! Presets, unlock rules and lock resolution.
//!
//! Unlock and success policies are plain data (tagged enums) so trainers can
//! be described in static configuration, serialized and tested without
//! touching the session flow.
//!
//! Lock resolution for a preset:
//! 1. A `Custom` policy delegates to its rule table.
//! 2. A `Linear` policy walks the declared order up to the target preset;
//!    the first prerequisite that is not completed locks it.
//! 3. The preset's own `unlock` rule applies on top, whatever the policy.
//!
//! Callers that have not loaded progress yet must pass `None`; gating is
//! suppressed rather than evaluated against empty progress.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::progress::{Archetype, Progress, ProgressFlag};
use crate::core::session::Metrics;
use crate::error::{AbacusError, Result};

/// Identifier of a preset, either a simple token or parameterized (`race:2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetId(String);

impl PresetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the id into the mode it represents.
    pub fn kind(&self) -> PresetKind {
        PresetKind::parse(&self.0)
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PresetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The mode a preset id stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PresetKind {
    /// Free practice; never moves progress.
    Training,
    Accuracy,
    Speed,
    /// `lvlN`
    Level(u8),
    /// `race` or `race:N`
    Race(u8),
    Custom(String),
}

impl PresetKind {
    /// Parse a preset id.
    pub fn parse(id: &str) -> Self {
        match id {
            "training" => return Self::Training,
            "accuracy" => return Self::Accuracy,
            "speed" => return Self::Speed,
            "race" => return Self::Race(1),
            _ => {}
        }
        if let Some(level) = id.strip_prefix("race:") {
            if let Ok(n) = level.parse::<u8>() {
                return Self::Race(n);
            }
        }
        if let Some(level) = id.strip_prefix("lvl") {
            if let Ok(n) = level.parse::<u8>() {
                return Self::Level(n);
            }
        }
        Self::Custom(id.to_string())
    }

    pub fn is_race(&self) -> bool {
        matches!(self, Self::Race(_))
    }

    pub fn is_training(&self) -> bool {
        matches!(self, Self::Training)
    }
}

/// Predicate over a trainer's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ProgressRule {
    Always,
    Flag { flag: ProgressFlag },
    MinRaceStars { stars: u8 },
    AllOf { rules: Vec<ProgressRule> },
    AnyOf { rules: Vec<ProgressRule> },
}

impl ProgressRule {
    pub fn flag(flag: ProgressFlag) -> Self {
        Self::Flag { flag }
    }

    pub fn min_race_stars(stars: u8) -> Self {
        Self::MinRaceStars { stars }
    }

    pub fn all_of(rules: Vec<ProgressRule>) -> Self {
        Self::AllOf { rules }
    }

    pub fn any_of(rules: Vec<ProgressRule>) -> Self {
        Self::AnyOf { rules }
    }

    /// Whether the rule holds.
    pub fn holds(&self, progress: &Progress) -> bool {
        self.unmet(progress).is_none()
    }

    /// Describe the first unmet requirement, `None` if the rule holds.
    pub fn unmet(&self, progress: &Progress) -> Option<String> {
        match self {
            Self::Always => None,
            Self::Flag { flag } => {
                if progress.flag(*flag) {
                    None
                } else {
                    Some(format!("requires {} mode completed", flag))
                }
            }
            Self::MinRaceStars { stars } => {
                if progress.race_stars() >= *stars {
                    None
                } else {
                    Some(format!(
                        "requires {} race star{} (have {})",
                        stars,
                        if *stars == 1 { "" } else { "s" },
                        progress.race_stars()
                    ))
                }
            }
            Self::AllOf { rules } => rules.iter().find_map(|r| r.unmet(progress)),
            Self::AnyOf { rules } => {
                if rules.is_empty() || rules.iter().any(|r| r.holds(progress)) {
                    None
                } else {
                    let reasons: Vec<String> =
                        rules.iter().filter_map(|r| r.unmet(progress)).collect();
                    Some(reasons.join(" or "))
                }
            }
        }
    }
}

/// A metric a success policy can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Total,
    Solved,
    Correct,
    Mistakes,
    ElapsedSec,
    Stars,
    AccuracyPercent,
}

impl MetricField {
    fn read(&self, metrics: &Metrics) -> Option<f64> {
        match self {
            Self::Total => Some(metrics.total as f64),
            Self::Solved => Some(metrics.solved as f64),
            Self::Correct => Some(metrics.clamped_correct() as f64),
            Self::Mistakes => metrics.mistakes.map(|m| m as f64),
            Self::ElapsedSec => Some(metrics.elapsed_sec),
            Self::Stars => Some(metrics.stars as f64),
            Self::AccuracyPercent => metrics.accuracy_percent(),
        }
    }
}

/// How a trainer decides a run was a success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SuccessPolicy {
    /// Every problem solved, mistakes known and zero.
    NoMistakes,
    MinAccuracy { percent: f64 },
    AtLeast { field: MetricField, value: f64 },
    AtMost { field: MetricField, value: f64 },
    Won,
    All { policies: Vec<SuccessPolicy> },
    Any { policies: Vec<SuccessPolicy> },
}

impl SuccessPolicy {
    /// Evaluate the policy. A metric the run did not record fails the test.
    pub fn evaluate(&self, metrics: &Metrics) -> bool {
        match self {
            Self::NoMistakes => metrics.is_perfect() && metrics.solved >= metrics.total,
            Self::MinAccuracy { percent } => metrics
                .accuracy_percent()
                .is_some_and(|acc| acc >= *percent),
            Self::AtLeast { field, value } => field.read(metrics).is_some_and(|v| v >= *value),
            Self::AtMost { field, value } => field.read(metrics).is_some_and(|v| v <= *value),
            Self::Won => metrics.won == Some(true),
            Self::All { policies } => policies.iter().all(|p| p.evaluate(metrics)),
            Self::Any { policies } => policies.iter().any(|p| p.evaluate(metrics)),
        }
    }
}

/// Default session parameters of a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub problem_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_sec: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_ppm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_level: Option<u8>,
}

impl SessionDefaults {
    pub fn problems(problem_count: u32) -> Self {
        Self {
            problem_count,
            time_limit_sec: None,
            opponent_ppm: None,
            star_level: None,
        }
    }

    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit_sec = Some(seconds);
        self
    }

    pub fn with_opponent(mut self, ppm: f64, star_level: u8) -> Self {
        self.opponent_ppm = Some(ppm);
        self.star_level = Some(star_level);
        self
    }
}

/// One playable variant of a trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub title: String,
    pub description: String,
    pub defaults: SessionDefaults,
    /// `None` means "every problem solved".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessPolicy>,
    /// Extra gate applied on top of the trainer's unlock policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock: Option<ProgressRule>,
    /// Completion predicate used by linear policies. `None` counts as done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_when: Option<ProgressRule>,
}

impl Preset {
    pub fn new(id: &str, title: &str, description: &str, defaults: SessionDefaults) -> Self {
        Self {
            id: PresetId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            defaults,
            success: None,
            unlock: None,
            completed_when: None,
        }
    }

    pub fn with_success(mut self, policy: SuccessPolicy) -> Self {
        self.success = Some(policy);
        self
    }

    pub fn with_unlock(mut self, rule: ProgressRule) -> Self {
        self.unlock = Some(rule);
        self
    }

    pub fn completed_when(mut self, rule: ProgressRule) -> Self {
        self.completed_when = Some(rule);
        self
    }

    /// Apply the success policy to a run's metrics.
    pub fn is_success(&self, metrics: &Metrics) -> bool {
        match &self.success {
            Some(policy) => policy.evaluate(metrics),
            None => metrics.total > 0 && metrics.solved >= metrics.total,
        }
    }
}

/// How a trainer gates its presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum UnlockPolicy {
    /// Everything open.
    #[default]
    None,
    /// Preset N locked until all presets before it are completed.
    /// Without a declared order the preset list order is used.
    Linear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order: Option<Vec<PresetId>>,
    },
    /// Per-preset rules; presets without a rule are open.
    Custom { rules: BTreeMap<PresetId, ProgressRule> },
}

/// Lock state of a preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LockState {
    pub fn open() -> Self {
        Self {
            locked: false,
            reason: None,
        }
    }

    pub fn locked(reason: impl Into<String>) -> Self {
        Self {
            locked: true,
            reason: Some(reason.into()),
        }
    }
}

/// Select-screen projection of a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetView {
    pub id: PresetId,
    pub title: String,
    pub description: String,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub completed: bool,
}

/// A named exercise family. Built from static configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: String,
    pub title: String,
    /// Where "back" navigates from the select screen.
    pub back_target: String,
    pub archetype: Archetype,
    /// Recording kind, e.g. `column` or `drill`.
    pub kind: String,
    pub presets: Vec<Preset>,
    pub unlock_policy: UnlockPolicy,
}

impl Trainer {
    pub fn preset(&self, id: &PresetId) -> Option<&Preset> {
        self.presets.iter().find(|p| &p.id == id)
    }

    /// Look up a preset, failing for ids the trainer does not offer.
    pub fn require_preset(&self, id: &PresetId) -> Result<&Preset> {
        self.preset(id)
            .ok_or_else(|| AbacusError::unknown_preset(&self.id, id.as_str()))
    }

    /// Declared order first, then any remaining presets in list order.
    pub fn effective_order(&self) -> Vec<&Preset> {
        let mut ordered: Vec<&Preset> = Vec::with_capacity(self.presets.len());
        if let UnlockPolicy::Linear { order: Some(order) } = &self.unlock_policy {
            for id in order {
                if let Some(preset) = self.preset(id) {
                    if !ordered.iter().any(|p| p.id == preset.id) {
                        ordered.push(preset);
                    }
                }
            }
        }
        for preset in &self.presets {
            if !ordered.iter().any(|p| p.id == preset.id) {
                ordered.push(preset);
            }
        }
        ordered
    }

    /// Ordered prerequisites of a linear policy.
    fn linear_order(&self) -> Vec<&Preset> {
        match &self.unlock_policy {
            UnlockPolicy::Linear { order: Some(order) } => {
                order.iter().filter_map(|id| self.preset(id)).collect()
            }
            UnlockPolicy::Linear { order: None } => self.presets.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a preset counts as completed under `progress`.
    pub fn is_completed(&self, id: &PresetId, progress: &Progress) -> bool {
        match self.preset(id).and_then(|p| p.completed_when.as_ref()) {
            Some(rule) => rule.holds(progress),
            None => true,
        }
    }

    /// Full lock resolution for one preset.
    ///
    /// `progress == None` means "not loaded yet" and never locks.
    pub fn lock_state(&self, id: &PresetId, progress: Option<&Progress>) -> Result<LockState> {
        let preset = self.require_preset(id)?;
        let Some(progress) = progress else {
            return Ok(LockState::open());
        };

        match &self.unlock_policy {
            UnlockPolicy::None => {}
            UnlockPolicy::Custom { rules } => {
                if let Some(reason) = rules.get(id).and_then(|rule| rule.unmet(progress)) {
                    return Ok(LockState::locked(reason));
                }
            }
            UnlockPolicy::Linear { .. } => {
                let order = self.linear_order();
                if let Some(position) = order.iter().position(|p| &p.id == id) {
                    for prerequisite in &order[..position] {
                        if !self.is_completed(&prerequisite.id, progress) {
                            return Ok(LockState::locked(format!(
                                "complete '{}' first",
                                prerequisite.title
                            )));
                        }
                    }
                }
            }
        }

        if let Some(reason) = preset.unlock.as_ref().and_then(|rule| rule.unmet(progress)) {
            return Ok(LockState::locked(reason));
        }

        Ok(LockState::open())
    }

    /// Whether a preset is locked under loaded progress.
    pub fn is_locked(&self, id: &PresetId, progress: &Progress) -> bool {
        self.lock_state(id, Some(progress))
            .map(|state| state.locked)
            .unwrap_or(true)
    }

    /// The preset immediately after `current` in effective order.
    pub fn following_preset(&self, current: &PresetId) -> Option<&Preset> {
        let order = self.effective_order();
        let position = order.iter().position(|p| &p.id == current)?;
        order.get(position + 1).copied()
    }

    /// First preset after `current` that is unlocked under `progress`.
    pub fn next_preset(&self, current: &PresetId, progress: &Progress) -> Option<&Preset> {
        let order = self.effective_order();
        let position = order.iter().position(|p| &p.id == current)?;
        order[position + 1..]
            .iter()
            .find(|p| !self.is_locked(&p.id, progress))
            .copied()
    }

    /// Presets with lock/completed state, in effective order.
    pub fn preset_views(&self, progress: Option<&Progress>) -> Vec<PresetView> {
        self.effective_order()
            .into_iter()
            .map(|preset| {
                let lock = self
                    .lock_state(&preset.id, progress)
                    .unwrap_or_else(|_| LockState::open());
                PresetView {
                    id: preset.id.clone(),
                    title: preset.title.clone(),
                    description: preset.description.clone(),
                    locked: lock.locked,
                    reason: lock.reason,
                    completed: progress
                        .map(|p| preset.completed_when.is_some() && self.is_completed(&preset.id, p))
                        .unwrap_or(false),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::{LevelProgress, ModeProgress};

    fn linear_abc() -> Trainer {
        Trainer {
            id: "abc".to_string(),
            title: "ABC".to_string(),
            back_target: "/".to_string(),
            archetype: Archetype::Levels,
            kind: "drill".to_string(),
            presets: vec![
                Preset::new("lvl1", "A", "", SessionDefaults::problems(5))
                    .completed_when(ProgressRule::flag(ProgressFlag::Level(1))),
                Preset::new("lvl2", "B", "", SessionDefaults::problems(5))
                    .completed_when(ProgressRule::flag(ProgressFlag::Level(2))),
                Preset::new("lvl3", "C", "", SessionDefaults::problems(5))
                    .completed_when(ProgressRule::flag(ProgressFlag::Level(3))),
            ],
            unlock_policy: UnlockPolicy::Linear { order: None },
        }
    }

    fn levels(l1: bool, l2: bool, l3: bool) -> Progress {
        Progress::Levels(LevelProgress {
            lvl1: l1,
            lvl2: l2,
            lvl3: l3,
            race_stars: 0,
        })
    }

    #[test]
    fn test_preset_kind_parse() {
        assert_eq!(PresetKind::parse("training"), PresetKind::Training);
        assert_eq!(PresetKind::parse("race"), PresetKind::Race(1));
        assert_eq!(PresetKind::parse("race:2"), PresetKind::Race(2));
        assert_eq!(PresetKind::parse("lvl3"), PresetKind::Level(3));
        assert_eq!(
            PresetKind::parse("race:x"),
            PresetKind::Custom("race:x".to_string())
        );
        assert!(PresetId::new("race:3").kind().is_race());
    }

    #[test]
    fn test_linear_gating() {
        let trainer = linear_abc();
        let empty = levels(false, false, false);

        assert!(!trainer.is_locked(&"lvl1".into(), &empty));
        let state = trainer.lock_state(&"lvl2".into(), Some(&empty)).unwrap();
        assert!(state.locked);
        assert_eq!(state.reason.as_deref(), Some("complete 'A' first"));

        let a_done = levels(true, false, false);
        assert!(!trainer.is_locked(&"lvl2".into(), &a_done));
        let state = trainer.lock_state(&"lvl3".into(), Some(&a_done)).unwrap();
        assert_eq!(state.reason.as_deref(), Some("complete 'B' first"));
    }

    #[test]
    fn test_null_progress_never_locks() {
        let trainer = linear_abc();
        for view in trainer.preset_views(None) {
            assert!(!view.locked);
            assert!(!view.completed);
        }
    }

    #[test]
    fn test_unknown_preset_errors() {
        let trainer = linear_abc();
        assert!(trainer.lock_state(&"race:9".into(), None).is_err());
        assert!(trainer.is_locked(&"race:9".into(), &levels(true, true, true)));
    }

    #[test]
    fn test_own_unlock_applies_on_top() {
        let mut trainer = linear_abc();
        trainer.presets[0].unlock = Some(ProgressRule::min_race_stars(1));
        let state = trainer
            .lock_state(&"lvl1".into(), Some(&levels(false, false, false)))
            .unwrap();
        assert!(state.locked);
        assert!(state.reason.unwrap().contains("1 race star"));
    }

    #[test]
    fn test_custom_policy_delegates() {
        let mut trainer = linear_abc();
        let mut rules = BTreeMap::new();
        rules.insert(
            PresetId::new("lvl3"),
            ProgressRule::flag(ProgressFlag::Level(1)),
        );
        trainer.unlock_policy = UnlockPolicy::Custom { rules };

        let empty = levels(false, false, false);
        assert!(!trainer.is_locked(&"lvl2".into(), &empty));
        assert!(trainer.is_locked(&"lvl3".into(), &empty));
        assert!(!trainer.is_locked(&"lvl3".into(), &levels(true, false, false)));
    }

    #[test]
    fn test_no_policy_opens_everything() {
        let mut trainer = linear_abc();
        trainer.unlock_policy = UnlockPolicy::None;
        assert!(!trainer.is_locked(&"lvl3".into(), &levels(false, false, false)));
    }

    #[test]
    fn test_next_preset_skips_locked() {
        let mut trainer = linear_abc();
        trainer.unlock_policy = UnlockPolicy::None;
        trainer.presets[1].unlock = Some(ProgressRule::min_race_stars(3));

        let progress = levels(true, false, false);
        let next = trainer.next_preset(&"lvl1".into(), &progress).unwrap();
        assert_eq!(next.id.as_str(), "lvl3");
        assert!(trainer.next_preset(&"lvl3".into(), &progress).is_none());
        assert_eq!(
            trainer.following_preset(&"lvl1".into()).unwrap().id.as_str(),
            "lvl2"
        );
    }

    #[test]
    fn test_declared_order_comes_first() {
        let mut trainer = linear_abc();
        trainer.unlock_policy = UnlockPolicy::Linear {
            order: Some(vec!["lvl2".into(), "lvl1".into()]),
        };
        let ids: Vec<&str> = trainer
            .effective_order()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["lvl2", "lvl1", "lvl3"]);

        // lvl3 is outside the declared order and not linearly gated
        assert!(!trainer.is_locked(&"lvl3".into(), &levels(false, false, false)));
        assert!(trainer.is_locked(&"lvl1".into(), &levels(false, false, false)));
    }

    #[test]
    fn test_success_policies() {
        let metrics = Metrics {
            total: 10,
            solved: 10,
            correct: 9,
            mistakes: Some(1),
            elapsed_sec: 50.0,
            won: Some(true),
            stars: 2,
            badges: vec![],
        };
        assert!(!SuccessPolicy::NoMistakes.evaluate(&metrics));
        assert!(SuccessPolicy::MinAccuracy { percent: 90.0 }.evaluate(&metrics));
        assert!(!SuccessPolicy::MinAccuracy { percent: 95.0 }.evaluate(&metrics));
        assert!(SuccessPolicy::Won.evaluate(&metrics));
        assert!(SuccessPolicy::All {
            policies: vec![
                SuccessPolicy::Won,
                SuccessPolicy::AtMost {
                    field: MetricField::ElapsedSec,
                    value: 60.0
                },
            ]
        }
        .evaluate(&metrics));
        assert!(SuccessPolicy::Any {
            policies: vec![
                SuccessPolicy::NoMistakes,
                SuccessPolicy::AtLeast {
                    field: MetricField::Stars,
                    value: 2.0
                },
            ]
        }
        .evaluate(&metrics));

        let untracked = Metrics {
            mistakes: None,
            ..metrics
        };
        assert!(!SuccessPolicy::AtMost {
            field: MetricField::Mistakes,
            value: 3.0
        }
        .evaluate(&untracked));
    }

    #[test]
    fn test_default_success_requires_all_solved() {
        let preset = Preset::new("training", "Training", "", SessionDefaults::problems(5));
        let mut metrics = Metrics {
            total: 5,
            solved: 4,
            ..Default::default()
        };
        assert!(!preset.is_success(&metrics));
        metrics.solved = 5;
        assert!(preset.is_success(&metrics));
    }

    #[test]
    fn test_rule_reasons() {
        let progress = Progress::Modes(ModeProgress::default());
        let rule = ProgressRule::all_of(vec![
            ProgressRule::flag(ProgressFlag::Speed),
            ProgressRule::min_race_stars(1),
        ]);
        assert_eq!(
            rule.unmet(&progress).as_deref(),
            Some("requires speed mode completed")
        );

        let any = ProgressRule::any_of(vec![
            ProgressRule::flag(ProgressFlag::Accuracy),
            ProgressRule::min_race_stars(2),
        ]);
        let reason = any.unmet(&progress).unwrap();
        assert!(reason.contains(" or "));
    }

    #[test]
    fn test_policy_serialization() {
        let policy = UnlockPolicy::Linear {
            order: Some(vec!["training".into(), "accuracy".into()]),
        };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains(r#""policy":"linear""#));
        let parsed: UnlockPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, policy);

        let rule = ProgressRule::min_race_stars(2);
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"rule":"min_race_stars","stars":2}"#);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // B is locked whenever A is incomplete, C whenever B is incomplete,
            // independent of the order presets are queried in.
            #[test]
            fn prop_linear_unlock_consistency(
                l1 in any::<bool>(),
                l2 in any::<bool>(),
                l3 in any::<bool>(),
                reverse in any::<bool>(),
            ) {
                let trainer = linear_abc();
                let progress = levels(l1, l2, l3);
                let mut ids = vec!["lvl1", "lvl2", "lvl3"];
                if reverse {
                    ids.reverse();
                }
                for id in ids {
                    let locked = trainer.is_locked(&id.into(), &progress);
                    match id {
                        "lvl2" if !l1 => prop_assert!(locked),
                        "lvl3" if !l2 || !l1 => prop_assert!(locked),
                        "lvl1" => prop_assert!(!locked),
                        _ => prop_assert!(!locked),
                    }
                }
            }
        }
    }
}
