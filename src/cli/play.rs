//! Play command for Abacus.
//!
//! Drives one scripted run through the full session flow: load progress,
//! select a preset, start, let the clock run for the reported time, submit
//! the outcome, record it, then walk the celebrations to the result screen.

use std::time::Instant;

use serde::Serialize;

use crate::config::FlowConfig;
use crate::core::{ConfigOverrides, PresetId, RawOutcome, SessionConfig};
use crate::error::{AbacusError, Result};
use crate::flow::{Celebration, ClockTick, ResultView, SessionFlow, Stage};
use crate::recording::ProgressApi;
use crate::trainers::TrainerRegistry;

/// Options for the play command.
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    pub learner: String,
    pub trainer: String,
    pub preset: String,
    /// Problems solved; defaults to all of them.
    pub solved: Option<u32>,
    pub mistakes: u32,
    pub elapsed_sec: f64,
    /// Race result; derived from the opponent clock when omitted.
    pub won: Option<bool>,
    pub overrides: ConfigOverrides,
}

/// Output format for the play command.
#[derive(Debug, Clone, Serialize)]
pub struct PlayOutput {
    /// Whether the run reached the result screen.
    pub success: bool,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<SessionConfig>,
    /// Clock state when the run ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<ClockTick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    pub celebrations: Vec<Celebration>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlayOutput {
    fn failure(stage: Stage, error: impl Into<String>) -> Self {
        Self {
            success: false,
            stage,
            config: None,
            clock: None,
            result: None,
            celebrations: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The play command implementation.
pub struct PlayCommand<A: ProgressApi> {
    api: A,
    registry: TrainerRegistry,
    flow_config: FlowConfig,
}

impl<A: ProgressApi> PlayCommand<A> {
    pub fn new(api: A, registry: TrainerRegistry, flow_config: FlowConfig) -> Self {
        Self {
            api,
            registry,
            flow_config,
        }
    }

    /// Run the play command.
    pub fn run(&self, options: &PlayOptions) -> PlayOutput {
        let mut flow = match self
            .registry
            .get(&options.trainer)
            .and_then(|adapter| SessionFlow::new(options.learner.as_str(), adapter, &self.flow_config))
        {
            Ok(flow) => flow,
            Err(e) => return PlayOutput::failure(Stage::Entry, e.to_string()),
        };

        let output = self
            .play(&mut flow, options)
            .unwrap_or_else(|e| PlayOutput::failure(flow.stage(), e.to_string()));
        flow.teardown();
        output
    }

    fn play(&self, flow: &mut SessionFlow, options: &PlayOptions) -> Result<PlayOutput> {
        let load = flow.begin_load()?;
        flow.on_progress_loaded(self.api.load_progress(&load.learner_id, &load.trainer_id))?;
        if let Some(error) = flow.load_error() {
            return Ok(PlayOutput::failure(
                flow.stage(),
                format!("Could not load progress: {}", error),
            ));
        }

        flow.select_preset(&PresetId::new(options.preset.as_str()))?;
        flow.apply_overrides(&options.overrides)?;
        let config = flow.start()?;

        let clock = if flow.clock().is_running() {
            flow.tick(&config.token, options.elapsed_sec)
        } else {
            None
        };

        let solved = options
            .solved
            .unwrap_or(config.problem_count)
            .min(config.problem_count);
        let won = options.won.or_else(|| {
            clock
                .as_ref()
                .filter(|tick| tick.opponent_solved.is_some())
                .map(|tick| !tick.opponent_finished && solved == config.problem_count)
        });
        let outcome = RawOutcome {
            solved,
            total: config.problem_count,
            mistakes: options.mistakes,
            elapsed_sec: options.elapsed_sec,
            won,
            stars: None,
        };

        let request = flow
            .submit_outcome(&config.token, &outcome)?
            .ok_or_else(|| AbacusError::invalid_state("Run ended before its result"))?;
        let started = Instant::now();
        let recorded = self.api.record_attempt(&request);
        flow.complete_recording(&config.token, recorded, started.elapsed())?;

        let mut celebrations = Vec::new();
        while flow.stage() == Stage::Achievements {
            if let Some(celebration) = flow.current_celebration() {
                celebrations.push(celebration.clone());
            }
            flow.acknowledge_celebration()?;
        }

        Ok(PlayOutput {
            success: true,
            stage: flow.stage(),
            config: Some(config),
            clock,
            result: flow.last_result().cloned(),
            celebrations,
            error: None,
        })
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PlayOutput, options: &PlayOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            format_human_readable(output)
        }
    }
}

fn format_human_readable(output: &PlayOutput) -> String {
    if !output.success {
        return format!(
            "Play failed ({}): {}",
            output.stage,
            output.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut lines = Vec::new();
    if let Some(config) = &output.config {
        lines.push(format!(
            "Played {} ({} problems)",
            config.preset_id, config.problem_count
        ));
    }
    if let Some(tick) = &output.clock {
        if let Some(remaining) = tick.remaining_sec {
            lines.push(format!("  time left: {:.0}s", remaining));
        }
        if let Some(opponent) = tick.opponent_solved {
            lines.push(format!("  opponent solved: {}", opponent));
        }
    }

    for celebration in &output.celebrations {
        match celebration {
            Celebration::Achievement(a) => {
                lines.push(format!("  {} Achievement unlocked: {}", a.icon, a.title))
            }
            Celebration::PresetUnlocked { title, .. } => {
                lines.push(format!("  New mode unlocked: {}", title))
            }
        }
    }

    if let Some(view) = &output.result {
        let m = &view.result.metrics;
        lines.push(format!(
            "{}: {}/{} solved, {} stars",
            if view.result.success {
                "Success"
            } else {
                "Not yet"
            },
            m.solved,
            m.total,
            m.stars
        ));
        if !m.badges.is_empty() {
            lines.push(format!("  badges: {}", m.badges.join(", ")));
        }
        if view.duplicate {
            lines.push("  (already recorded)".to_string());
        }
        if let Some(warning) = &view.sync_warning {
            lines.push(format!("  warning: {}", warning));
        }
        if let Some(next) = &view.next_preset {
            lines.push(format!("Next level: {}", next));
        }
    }
    lines.join("\n")
}
