//! Record command for Abacus.
//!
//! Interprets a raw exercise outcome through the trainer's adapter and runs
//! the recording protocol. Re-running with the same `--token` is a no-op
//! that reports `duplicate`.

use serde::Serialize;

use crate::core::{AttemptToken, PresetId, Progress, RawOutcome, SessionConfig, SessionResult};
use crate::error::Result;
use crate::recording::{ProgressApi, RecordRequest};
use crate::stats::{UnlockedAchievement, UserStats};
use crate::trainers::TrainerRegistry;

/// Options for the record command.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    pub learner: String,
    pub trainer: String,
    pub preset: String,
    /// Attempt token; omit to record without dedup protection.
    pub token: Option<String>,
    pub outcome: RawOutcome,
}

/// Output format for the record command.
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutput {
    /// Whether the command was successful.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<AttemptToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SessionResult>,
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    pub newly_unlocked: Vec<UnlockedAchievement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<UserStats>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            token: None,
            result: None,
            duplicate: false,
            progress: None,
            newly_unlocked: Vec::new(),
            stats: None,
            error: Some(error.into()),
        }
    }
}

/// The record command implementation.
pub struct RecordCommand<A: ProgressApi> {
    api: A,
    registry: TrainerRegistry,
}

impl<A: ProgressApi> RecordCommand<A> {
    pub fn new(api: A, registry: TrainerRegistry) -> Self {
        Self { api, registry }
    }

    /// Run the record command.
    pub fn run(&self, options: &RecordOptions) -> RecordOutput {
        self.record(options)
            .unwrap_or_else(|e| RecordOutput::failure(e.to_string()))
    }

    fn record(&self, options: &RecordOptions) -> Result<RecordOutput> {
        let adapter = self.registry.get(&options.trainer)?;
        let preset_id = PresetId::new(options.preset.as_str());
        let preset = adapter.trainer().require_preset(&preset_id)?;

        let token = options
            .token
            .as_deref()
            .map(AttemptToken::parse)
            .transpose()?;
        let mut config = SessionConfig::from_defaults(preset.id.clone(), &preset.defaults);
        if let Some(token) = &token {
            config.token = token.clone();
        }

        let result = adapter.interpret(&config, &options.outcome)?;
        let request = RecordRequest {
            learner_id: options.learner.clone(),
            trainer_id: options.trainer.clone(),
            token: token.clone(),
            preset_id,
            result: result.clone(),
        };
        let outcome = self.api.record_attempt(&request)?;

        Ok(RecordOutput {
            success: true,
            token,
            result: Some(result),
            duplicate: outcome.duplicate,
            progress: Some(outcome.progress),
            newly_unlocked: outcome.newly_unlocked,
            stats: Some(outcome.stats),
            error: None,
        })
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RecordOutput, options: &RecordOptions) -> String {
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

fn format_human_readable(output: &RecordOutput) -> String {
    if !output.success {
        return format!(
            "Record failed: {}",
            output.error.as_deref().unwrap_or("unknown error")
        );
    }
    if output.duplicate {
        return "Already recorded; nothing changed.".to_string();
    }

    let mut lines = Vec::new();
    if let Some(result) = &output.result {
        let m = &result.metrics;
        lines.push(format!(
            "{}: {}/{} solved, {} stars",
            if result.success { "Success" } else { "Not yet" },
            m.solved,
            m.total,
            m.stars
        ));
    }
    for achievement in &output.newly_unlocked {
        lines.push(format!(
            "{} Achievement unlocked: {}",
            achievement.icon, achievement.title
        ));
    }
    if output.token.is_none() {
        lines.push("Recorded without a token; a retry would count twice.".to_string());
    }
    lines.join("\n")
}
