//! Trainers command for Abacus.
//!
//! Lists the registered trainers and their presets. With a learner, each
//! preset carries the lock state resolved against that learner's progress.

use serde::Serialize;

use crate::core::{Archetype, PresetView, Progress};
use crate::error::Result;
use crate::recording::ProgressApi;
use crate::trainers::{TrainerAdapter, TrainerRegistry};

/// Options for the trainers command.
#[derive(Debug, Clone, Default)]
pub struct TrainersOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Resolve locks for this learner.
    pub learner: Option<String>,
    /// Only show this trainer.
    pub trainer: Option<String>,
}

/// One trainer with its presets.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerInfo {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub archetype: Archetype,
    pub back_target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    pub presets: Vec<PresetView>,
}

/// Output format for the trainers command.
#[derive(Debug, Clone, Serialize)]
pub struct TrainersOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub trainers: Vec<TrainerInfo>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrainersOutput {
    pub fn success(trainers: Vec<TrainerInfo>) -> Self {
        Self {
            success: true,
            trainers,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            trainers: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The trainers command implementation.
pub struct TrainersCommand<A: ProgressApi> {
    api: A,
    registry: TrainerRegistry,
}

impl<A: ProgressApi> TrainersCommand<A> {
    pub fn new(api: A, registry: TrainerRegistry) -> Self {
        Self { api, registry }
    }

    /// Run the trainers command.
    pub fn run(&self, options: &TrainersOptions) -> TrainersOutput {
        match self.collect(options) {
            Ok(trainers) => TrainersOutput::success(trainers),
            Err(e) => TrainersOutput::failure(e.to_string()),
        }
    }

    fn collect(&self, options: &TrainersOptions) -> Result<Vec<TrainerInfo>> {
        let ids: Vec<String> = match &options.trainer {
            Some(id) => vec![self.registry.get(id)?.id().to_string()],
            None => self.registry.trainers().iter().map(|t| t.id.clone()).collect(),
        };

        let mut infos = Vec::with_capacity(ids.len());
        for id in ids {
            let adapter = self.registry.get(&id)?;
            let progress = match &options.learner {
                Some(learner) => Some(self.api.load_progress(learner, &id)?),
                None => None,
            };
            infos.push(describe(adapter.as_ref(), progress));
        }
        Ok(infos)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &TrainersOutput, options: &TrainersOptions) -> String {
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

fn describe(adapter: &dyn TrainerAdapter, progress: Option<Progress>) -> TrainerInfo {
    let trainer = adapter.trainer();
    TrainerInfo {
        id: trainer.id.clone(),
        title: trainer.title.clone(),
        kind: trainer.kind.clone(),
        archetype: trainer.archetype,
        back_target: trainer.back_target.clone(),
        presets: trainer.preset_views(progress.as_ref()),
        progress,
    }
}

fn format_human_readable(output: &TrainersOutput) -> String {
    if !output.success {
        return format!(
            "Trainers failed: {}",
            output.error.as_deref().unwrap_or("unknown error")
        );
    }
    if output.trainers.is_empty() {
        return "No trainers registered.".to_string();
    }

    let mut lines = Vec::new();
    for trainer in &output.trainers {
        lines.push(format!("{} ({})", trainer.title, trainer.id));
        for preset in &trainer.presets {
            let marker = if preset.completed {
                "[x]"
            } else if preset.locked {
                "[#]"
            } else {
                "[ ]"
            };
            let mut line = format!("  {} {:<10} {}", marker, preset.id.as_str(), preset.title);
            if let Some(reason) = &preset.reason {
                line.push_str(&format!("  ({})", reason));
            }
            lines.push(line);
        }
        lines.push(String::new());
    }
    lines.pop();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::recording::Recorder;
    use crate::storage::MemoryLearnerStore;

    fn command() -> TrainersCommand<Recorder<MemoryLearnerStore>> {
        let registry = TrainerRegistry::builtin();
        let recorder = Recorder::new(MemoryLearnerStore::new(), registry.clone(), &Config::default());
        TrainersCommand::new(recorder, registry)
    }

    #[test]
    fn test_lists_builtin_without_gating() {
        let cmd = command();
        let output = cmd.run(&TrainersOptions::default());

        assert!(output.success);
        assert_eq!(output.trainers.len(), 3);
        assert!(output
            .trainers
            .iter()
            .flat_map(|t| &t.presets)
            .all(|p| !p.locked));
    }

    #[test]
    fn test_learner_gating() {
        let cmd = command();
        let output = cmd.run(&TrainersOptions {
            learner: Some("ada".to_string()),
            trainer: Some("times-tables".to_string()),
            ..Default::default()
        });

        assert!(output.success);
        let presets = &output.trainers[0].presets;
        assert!(!presets.iter().find(|p| p.id.as_str() == "lvl1").unwrap().locked);
        assert!(presets.iter().find(|p| p.id.as_str() == "lvl2").unwrap().locked);

        let text = cmd.format_output(&output, &TrainersOptions::default());
        assert!(text.contains("[#]"));
    }

    #[test]
    fn test_unknown_trainer() {
        let cmd = command();
        let output = cmd.run(&TrainersOptions {
            trainer: Some("nope".to_string()),
            ..Default::default()
        });
        assert!(!output.success);
        assert!(output.error.unwrap().contains("nope"));
    }

    #[test]
    fn test_quiet_and_json() {
        let cmd = command();
        let output = cmd.run(&TrainersOptions::default());
        let quiet = TrainersOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&output, &quiet).is_empty());

        let json = TrainersOptions {
            json: true,
            ..Default::default()
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &json)).unwrap();
        assert_eq!(parsed["success"], true);
    }
}
