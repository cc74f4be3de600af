//! Session flow state machine.
//!
//! Drives one learner through one trainer:
//!
//! ```text
//! entry -> select -> session -> [achievements] -> result
//!            ^          |  ^                        |
//!            +----------+  +------ retry / next ----+
//! ```
//!
//! The machine is synchronous and event driven. It never performs I/O
//! itself: loads and recordings are handed to the caller as requests, and
//! their results are fed back in. Every run carries its own attempt token;
//! events for any other token are ignored.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::FlowConfig;
use crate::core::{
    validate_learner_id, AttemptToken, ConfigOverrides, PresetId, PresetView, Progress,
    RawOutcome, SessionConfig, SessionResult, Trainer,
};
use crate::error::{AbacusError, Result};
use crate::flow::clock::{ClockTick, SessionClock};
use crate::recording::{RecordOutcome, RecordRequest};
use crate::stats::UnlockedAchievement;
use crate::trainers::TrainerAdapter;

/// Screen the flow is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Entry,
    Select,
    Session,
    Achievements,
    Result,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Entry => "entry",
            Self::Select => "select",
            Self::Session => "session",
            Self::Achievements => "achievements",
            Self::Result => "result",
        };
        f.write_str(name)
    }
}

/// Progress fetch the caller should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub learner_id: String,
    pub trainer_id: String,
}

/// One celebratory reveal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Celebration {
    Achievement(UnlockedAchievement),
    PresetUnlocked { preset_id: PresetId, title: String },
}

/// What the result screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub preset_id: PresetId,
    pub result: SessionResult,
    /// The recording committed (or had already been committed).
    pub saved: bool,
    pub duplicate: bool,
    /// Non-fatal sync problem to surface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_warning: Option<String>,
    /// Preset directly after this one became selectable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_preset: Option<PresetId>,
    /// Where "next level" goes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_preset: Option<PresetId>,
}

/// Client-side session flow for one learner on one trainer.
pub struct SessionFlow {
    learner_id: String,
    adapter: Arc<dyn TrainerAdapter>,
    stage: Stage,
    /// `None` until the first successful load.
    progress: Option<Progress>,
    loading: bool,
    load_error: Option<String>,
    config: Option<SessionConfig>,
    /// Token of the run currently in play.
    active_token: Option<AttemptToken>,
    /// Result waiting for its recording to complete.
    in_flight: Option<(AttemptToken, SessionResult)>,
    celebrations: VecDeque<Celebration>,
    last_result: Option<ResultView>,
    clock: SessionClock,
    persistence_timeout: Duration,
}

impl SessionFlow {
    /// Create a flow in the entry stage.
    pub fn new(
        learner_id: impl Into<String>,
        adapter: Arc<dyn TrainerAdapter>,
        flow: &FlowConfig,
    ) -> Result<Self> {
        let learner_id = learner_id.into();
        validate_learner_id(&learner_id)?;
        Ok(Self {
            learner_id,
            adapter,
            stage: Stage::Entry,
            progress: None,
            loading: false,
            load_error: None,
            config: None,
            active_token: None,
            in_flight: None,
            celebrations: VecDeque::new(),
            last_result: None,
            clock: SessionClock::new(),
            persistence_timeout: Duration::from_millis(flow.persistence_timeout_ms),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }

    pub fn trainer(&self) -> &Trainer {
        self.adapter.trainer()
    }

    /// Back-navigation target of the trainer.
    pub fn back_target(&self) -> &str {
        &self.trainer().back_target
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last load failure, shown with a retry action.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Configuration selected or in play.
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn active_token(&self) -> Option<&AttemptToken> {
        self.active_token.as_ref()
    }

    /// Whether a recording is awaiting its response.
    pub fn is_recording(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_result(&self) -> Option<&ResultView> {
        self.last_result.as_ref()
    }

    /// Celebration currently on screen.
    pub fn current_celebration(&self) -> Option<&Celebration> {
        self.celebrations.front()
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Presets with lock state. Gating is off until progress has loaded.
    pub fn presets(&self) -> Vec<PresetView> {
        self.trainer().preset_views(self.progress.as_ref())
    }

    fn require_stage(&self, allowed: &[Stage], action: &str) -> Result<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(AbacusError::invalid_state(format!(
                "Cannot {} in {} state",
                action, self.stage
            )))
        }
    }

    // =========================================================================
    // Entry
    // =========================================================================

    /// Start (or restart) the progress load. Calling again while a load is
    /// pending re-issues the same request.
    pub fn begin_load(&mut self) -> Result<LoadRequest> {
        self.require_stage(&[Stage::Entry], "load progress")?;
        self.loading = true;
        self.load_error = None;
        Ok(LoadRequest {
            learner_id: self.learner_id.clone(),
            trainer_id: self.trainer().id.clone(),
        })
    }

    /// Feed the load result back. A failure keeps the flow in entry; it
    /// never falls through to empty progress.
    pub fn on_progress_loaded(&mut self, loaded: Result<Progress>) -> Result<()> {
        self.require_stage(&[Stage::Entry], "accept progress")?;
        if !self.loading {
            return Err(AbacusError::invalid_state("No progress load in flight"));
        }
        self.loading = false;

        match loaded {
            Ok(progress) => {
                self.progress = Some(progress.normalize(self.trainer().archetype));
                self.stage = Stage::Select;
                tracing::debug!(learner = %self.learner_id, trainer = %self.trainer().id, "progress loaded");
            }
            Err(err) => {
                tracing::warn!(learner = %self.learner_id, trainer = %self.trainer().id, error = %err, "progress load failed");
                self.load_error = Some(err.to_string());
            }
        }
        Ok(())
    }

    // =========================================================================
    // Select
    // =========================================================================

    /// Select a preset and snapshot its default configuration.
    pub fn select_preset(&mut self, preset_id: &PresetId) -> Result<&SessionConfig> {
        self.require_stage(&[Stage::Select], "select a preset")?;
        let trainer = self.adapter.trainer();
        let preset = trainer.require_preset(preset_id)?;
        let lock = trainer.lock_state(preset_id, self.progress.as_ref())?;
        if lock.locked {
            return Err(AbacusError::validation(format!(
                "Preset {} is locked: {}",
                preset_id,
                lock.reason.unwrap_or_default()
            )));
        }
        let config = SessionConfig::from_defaults(preset.id.clone(), &preset.defaults);
        Ok(&*self.config.insert(config))
    }

    /// Apply advanced overrides to the selected configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        self.require_stage(&[Stage::Select], "apply overrides")?;
        let current = self
            .config
            .as_ref()
            .ok_or_else(|| AbacusError::invalid_state("No preset selected"))?;
        self.config = Some(current.with_overrides(overrides)?);
        Ok(())
    }

    /// Start the selected preset with a fresh token.
    pub fn start(&mut self) -> Result<SessionConfig> {
        self.require_stage(&[Stage::Select], "start")?;
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AbacusError::invalid_state("No preset selected"))?
            .with_fresh_token();
        Ok(self.launch(config))
    }

    fn launch(&mut self, config: SessionConfig) -> SessionConfig {
        self.clock.cancel();
        if SessionClock::is_needed(&config) {
            self.clock.start(&config);
        }
        self.active_token = Some(config.token.clone());
        self.in_flight = None;
        self.celebrations.clear();
        self.stage = Stage::Session;
        tracing::debug!(
            learner = %self.learner_id,
            preset = %config.preset_id,
            token = %config.token,
            "session started"
        );
        self.config = Some(config.clone());
        config
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Clock tick from the runner's timer. Stale tokens are ignored.
    pub fn tick(&mut self, token: &AttemptToken, dt_sec: f64) -> Option<ClockTick> {
        if self.stage != Stage::Session || self.in_flight.is_some() {
            return None;
        }
        self.clock.tick(token, dt_sec)
    }

    /// Interpret a raw runner outcome, then submit it.
    ///
    /// An outcome the trainer cannot interpret ends the run: the flow goes
    /// back to select with the configuration kept, and nothing is recorded.
    pub fn submit_outcome(
        &mut self,
        token: &AttemptToken,
        outcome: &RawOutcome,
    ) -> Result<Option<RecordRequest>> {
        if !self.accepts(token) {
            return Ok(None);
        }
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AbacusError::invalid_state("No session configured"))?;
        let result = match self.adapter.interpret(config, outcome) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    learner = %self.learner_id,
                    token = %token,
                    error = %err,
                    "runner outcome rejected, abandoning run"
                );
                self.abandon_run();
                return Err(err);
            }
        };
        self.submit_result(token, result)
    }

    fn accepts(&self, token: &AttemptToken) -> bool {
        if self.stage != Stage::Session || self.active_token.as_ref() != Some(token) {
            tracing::debug!(token = %token, stage = %self.stage, "ignoring result for inactive token");
            return false;
        }
        if self.in_flight.is_some() {
            tracing::debug!(token = %token, "ignoring second result for token");
            return false;
        }
        true
    }

    /// Accept the run's single result and return the recording to perform.
    ///
    /// Results for a token that is no longer in play are dropped (`Ok(None)`).
    pub fn submit_result(
        &mut self,
        token: &AttemptToken,
        result: SessionResult,
    ) -> Result<Option<RecordRequest>> {
        if !self.accepts(token) {
            return Ok(None);
        }
        let preset_id = self
            .config
            .as_ref()
            .map(|c| c.preset_id.clone())
            .ok_or_else(|| AbacusError::invalid_state("No session configured"))?;

        self.clock.cancel();
        self.in_flight = Some((token.clone(), result.clone()));
        Ok(Some(RecordRequest {
            learner_id: self.learner_id.clone(),
            trainer_id: self.trainer().id.clone(),
            token: Some(token.clone()),
            preset_id,
            result,
        }))
    }

    /// Feed the recording response back.
    ///
    /// A failed recording still reaches the result screen with the
    /// client-known outcome and a sync warning. So does one that committed
    /// but took longer than the persistence budget.
    pub fn complete_recording(
        &mut self,
        token: &AttemptToken,
        recorded: Result<RecordOutcome>,
        elapsed: Duration,
    ) -> Result<Stage> {
        let Some((pending, result)) = self.in_flight.take() else {
            tracing::debug!(token = %token, "no recording in flight, ignoring response");
            return Ok(self.stage);
        };
        if &pending != token || self.active_token.as_ref() != Some(token) {
            self.in_flight = Some((pending, result));
            tracing::debug!(token = %token, "ignoring recording response for stale token");
            return Ok(self.stage);
        }

        let preset_id = self
            .config
            .as_ref()
            .map(|c| c.preset_id.clone())
            .ok_or_else(|| AbacusError::invalid_state("No session configured"))?;
        let trainer = self.adapter.trainer();
        let before = self.progress;

        let mut view = ResultView {
            preset_id: preset_id.clone(),
            result,
            saved: false,
            duplicate: false,
            sync_warning: None,
            unlocked_preset: None,
            next_preset: None,
        };
        self.celebrations.clear();

        match recorded {
            Ok(outcome) => {
                let after = outcome.progress.normalize(trainer.archetype);
                self.progress = Some(after);
                view.saved = true;
                view.duplicate = outcome.duplicate;

                if elapsed > self.persistence_timeout {
                    tracing::warn!(
                        learner = %self.learner_id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "recording exceeded persistence budget"
                    );
                    view.sync_warning = Some(format!(
                        "Saving took {} ms (budget {} ms)",
                        elapsed.as_millis(),
                        self.persistence_timeout.as_millis()
                    ));
                }

                if let (Some(before), Some(following)) =
                    (before, trainer.following_preset(&preset_id))
                {
                    if trainer.is_locked(&following.id, &before)
                        && !trainer.is_locked(&following.id, &after)
                    {
                        view.unlocked_preset = Some(following.id.clone());
                        self.celebrations.push_back(Celebration::PresetUnlocked {
                            preset_id: following.id.clone(),
                            title: following.title.clone(),
                        });
                    }
                }
                self.celebrations.extend(
                    outcome
                        .newly_unlocked
                        .into_iter()
                        .map(Celebration::Achievement),
                );
            }
            Err(err) => {
                tracing::warn!(
                    learner = %self.learner_id,
                    token = %token,
                    error = %err,
                    recoverable = err.is_recoverable(),
                    "recording failed, showing unsaved result"
                );
                view.sync_warning = Some(format!("Progress not saved: {}", err));
            }
        }

        // "next level" is only offered after a successful run
        if view.result.success {
            view.next_preset = self
                .progress
                .as_ref()
                .and_then(|p| trainer.next_preset(&preset_id, p))
                .map(|p| p.id.clone());
        }
        self.last_result = Some(view);

        self.stage = if self.celebrations.is_empty() {
            Stage::Result
        } else {
            Stage::Achievements
        };
        Ok(self.stage)
    }

    // =========================================================================
    // Achievements / Result
    // =========================================================================

    /// Dismiss the current celebration.
    pub fn acknowledge_celebration(&mut self) -> Result<Stage> {
        self.require_stage(&[Stage::Achievements], "acknowledge a celebration")?;
        self.celebrations.pop_front();
        if self.celebrations.is_empty() {
            self.stage = Stage::Result;
        }
        Ok(self.stage)
    }

    /// Play the same preset again with a fresh token.
    ///
    /// From the session stage this abandons the current run without
    /// recording anything.
    pub fn retry(&mut self) -> Result<SessionConfig> {
        self.require_stage(
            &[Stage::Session, Stage::Achievements, Stage::Result],
            "retry",
        )?;
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AbacusError::invalid_state("No session configured"))?
            .with_fresh_token();
        Ok(self.launch(config))
    }

    /// Go straight to the next unlocked preset, or back to select if none.
    pub fn next_level(&mut self) -> Result<Option<SessionConfig>> {
        self.require_stage(&[Stage::Achievements, Stage::Result], "go to next level")?;
        let next = self.last_result.as_ref().and_then(|r| r.next_preset.clone());

        let Some(next) = next else {
            self.back_to_select()?;
            return Ok(None);
        };
        let preset = self.trainer().require_preset(&next)?;
        let config = SessionConfig::from_defaults(preset.id.clone(), &preset.defaults);
        Ok(Some(self.launch(config)))
    }

    /// Return to preset selection. Abandons a run in play.
    pub fn back_to_select(&mut self) -> Result<()> {
        self.require_stage(
            &[
                Stage::Select,
                Stage::Session,
                Stage::Achievements,
                Stage::Result,
            ],
            "return to select",
        )?;
        self.abandon_run();
        Ok(())
    }

    fn abandon_run(&mut self) {
        self.teardown();
        self.stage = Stage::Select;
    }

    /// Stop timers and forget the run in play.
    pub fn teardown(&mut self) {
        self.clock.cancel();
        self.active_token = None;
        self.in_flight = None;
        self.celebrations.clear();
    }
}

impl std::fmt::Debug for SessionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFlow")
            .field("learner_id", &self.learner_id)
            .field("trainer", &self.trainer().id)
            .field("stage", &self.stage)
            .field("active_token", &self.active_token)
            .finish()
    }
}
