//! Progress command for Abacus.
//!
//! Shows a learner's mastery record for one trainer, the resolved preset
//! locks, and the first playable preset that is not yet completed.

use serde::Serialize;

use crate::core::{PresetId, PresetView, Progress};
use crate::error::Result;
use crate::recording::ProgressApi;
use crate::trainers::TrainerRegistry;

/// Options for the progress command.
#[derive(Debug, Clone, Default)]
pub struct ProgressOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    pub learner: String,
    pub trainer: String,
}

/// Output format for the progress command.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub learner_id: String,
    pub trainer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    pub presets: Vec<PresetView>,
    /// First unlocked, uncompleted preset that counts toward mastery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested: Option<PresetId>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressOutput {
    fn failure(options: &ProgressOptions, error: impl Into<String>) -> Self {
        Self {
            success: false,
            learner_id: options.learner.clone(),
            trainer_id: options.trainer.clone(),
            progress: None,
            presets: Vec::new(),
            suggested: None,
            error: Some(error.into()),
        }
    }
}

/// The progress command implementation.
pub struct ProgressCommand<A: ProgressApi> {
    api: A,
    registry: TrainerRegistry,
}

impl<A: ProgressApi> ProgressCommand<A> {
    pub fn new(api: A, registry: TrainerRegistry) -> Self {
        Self { api, registry }
    }

    /// Run the progress command.
    pub fn run(&self, options: &ProgressOptions) -> ProgressOutput {
        self.load(options)
            .unwrap_or_else(|e| ProgressOutput::failure(options, e.to_string()))
    }

    fn load(&self, options: &ProgressOptions) -> Result<ProgressOutput> {
        let adapter = self.registry.get(&options.trainer)?;
        let progress = self.api.load_progress(&options.learner, &options.trainer)?;
        let presets = adapter.trainer().preset_views(Some(&progress));
        let suggested = presets
            .iter()
            .find(|p| !p.locked && !p.completed && !p.id.kind().is_training())
            .map(|p| p.id.clone());

        Ok(ProgressOutput {
            success: true,
            learner_id: options.learner.clone(),
            trainer_id: options.trainer.clone(),
            progress: Some(progress),
            presets,
            suggested,
            error: None,
        })
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ProgressOutput, options: &ProgressOptions) -> String {
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

fn describe_progress(progress: &Progress) -> String {
    let tick = |done: bool| if done { "done" } else { "-" };
    match progress {
        Progress::Modes(m) => format!(
            "accuracy: {}  speed: {}  race stars: {}",
            tick(m.accuracy),
            tick(m.speed),
            m.race_stars
        ),
        Progress::Levels(l) => format!(
            "level 1: {}  level 2: {}  level 3: {}  race stars: {}",
            tick(l.lvl1),
            tick(l.lvl2),
            tick(l.lvl3),
            l.race_stars
        ),
    }
}

fn format_human_readable(output: &ProgressOutput) -> String {
    if !output.success {
        return format!(
            "Progress failed: {}",
            output.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut lines = vec![format!("{} on {}", output.learner_id, output.trainer_id)];
    if let Some(progress) = &output.progress {
        lines.push(format!("  {}", describe_progress(progress)));
    }
    lines.push(String::new());

    for preset in &output.presets {
        let state = match (preset.completed, preset.locked) {
            (true, _) => "completed",
            (false, true) => "locked",
            (false, false) => "open",
        };
        let mut line = format!("  {:<10} {:<10} {}", preset.id.as_str(), state, preset.title);
        if let Some(reason) = &preset.reason {
            line.push_str(&format!(" ({})", reason));
        }
        lines.push(line);
    }

    if let Some(next) = &output.suggested {
        lines.push(String::new());
        lines.push(format!("Next up: {}", next));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::{AttemptToken, Metrics, SessionResult};
    use crate::recording::{RecordRequest, Recorder};
    use crate::storage::MemoryLearnerStore;

    fn command() -> ProgressCommand<Recorder<MemoryLearnerStore>> {
        let registry = TrainerRegistry::builtin();
        let recorder = Recorder::new(MemoryLearnerStore::new(), registry.clone(), &Config::default());
        ProgressCommand::new(recorder, registry)
    }

    fn options(trainer: &str) -> ProgressOptions {
        ProgressOptions {
            learner: "ada".to_string(),
            trainer: trainer.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_learner() {
        let cmd = command();
        let output = cmd.run(&options("column-addition"));

        assert!(output.success);
        assert_eq!(
            output.progress,
            Some(Progress::default_for(crate::core::Archetype::Modes))
        );
        assert_eq!(output.suggested.as_ref().map(|p| p.as_str()), Some("accuracy"));
    }

    #[test]
    fn test_reflects_recorded_level() {
        let cmd = command();
        cmd.api
            .record(&RecordRequest {
                learner_id: "ada".to_string(),
                trainer_id: "times-tables".to_string(),
                token: Some(AttemptToken::generate()),
                preset_id: PresetId::new("lvl1"),
                result: SessionResult::new(
                    true,
                    Metrics {
                        total: 10,
                        solved: 10,
                        correct: 10,
                        mistakes: Some(0),
                        elapsed_sec: 30.0,
                        ..Default::default()
                    },
                ),
            })
            .unwrap();

        let output = cmd.run(&options("times-tables"));
        assert_eq!(output.suggested.as_ref().map(|p| p.as_str()), Some("lvl2"));
        let text = cmd.format_output(&output, &options("times-tables"));
        assert!(text.contains("level 1: done"));
    }

    #[test]
    fn test_invalid_learner_fails() {
        let cmd = command();
        let output = cmd.run(&ProgressOptions {
            learner: "no spaces".to_string(),
            trainer: "column-addition".to_string(),
            ..Default::default()
        });
        assert!(!output.success);
        assert!(output.error.is_some());
    }
}
