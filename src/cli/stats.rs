//! Stats command for Abacus.
//!
//! Displays a learner's totals and the recent success histogram.

use serde::Serialize;

use crate::recording::ProgressApi;
use crate::stats::StatsSummary;

/// Options for the stats command.
#[derive(Debug, Clone, Default)]
pub struct StatsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    pub learner: String,
}

/// Output format for the stats command.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    /// Whether stats were loaded successfully.
    pub success: bool,
    pub learner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<StatsSummary>,
    /// Error message if stats failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The stats command implementation.
pub struct StatsCommand<A: ProgressApi> {
    api: A,
}

impl<A: ProgressApi> StatsCommand<A> {
    /// Create a new stats command.
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Run the stats command.
    pub fn run(&self, options: &StatsOptions) -> StatsOutput {
        match self.api.load_stats_summary(&options.learner) {
            Ok(summary) => StatsOutput {
                success: true,
                learner_id: options.learner.clone(),
                summary: Some(summary),
                error: None,
            },
            Err(e) => StatsOutput {
                success: false,
                learner_id: options.learner.clone(),
                summary: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
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

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds % 60)
    }
}

/// Format output as human-readable text.
fn format_human_readable(output: &StatsOutput) -> String {
    let summary = match (&output.summary, output.success) {
        (Some(summary), true) => summary,
        _ => {
            return format!(
                "Stats failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    };
    let totals = &summary.totals;
    if totals.is_empty() {
        return format!("No sessions recorded for {} yet.", output.learner_id);
    }

    let mut lines = vec![format!("Stats for {}", output.learner_id), String::new()];
    lines.push(format!("  Sessions:         {}", totals.sessions_count));
    lines.push(format!("  Problems:         {}", totals.total_problems));
    lines.push(format!("  Correct:          {}", totals.total_correct));
    lines.push(format!("  Mistakes:         {}", totals.total_mistakes));
    if let Some(accuracy) = summary.accuracy_percent {
        lines.push(format!("  Accuracy:         {:.1}%", accuracy));
    }
    lines.push(format!(
        "  Time trained:     {}",
        format_duration(totals.total_time_sec)
    ));
    lines.push(format!("  Perfect sessions: {}", totals.perfect_sessions_count));
    lines.push(format!("  Race wins:        {}", totals.race_wins_count));

    lines.push(String::new());
    lines.push(format!(
        "Last {} days ({} active):",
        summary.history.len(),
        summary.active_days
    ));
    for day in &summary.history {
        lines.push(format!(
            "  {} {:>3} {}",
            day.date.format("%a %d"),
            day.successful_sessions,
            "#".repeat(day.successful_sessions.min(40) as usize)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::{AttemptToken, Metrics, PresetId, SessionResult};
    use crate::recording::{RecordRequest, Recorder};
    use crate::storage::MemoryLearnerStore;
    use crate::trainers::TrainerRegistry;

    fn command() -> StatsCommand<Recorder<MemoryLearnerStore>> {
        StatsCommand::new(Recorder::new(
            MemoryLearnerStore::new(),
            TrainerRegistry::builtin(),
            &Config::default(),
        ))
    }

    fn options() -> StatsOptions {
        StatsOptions {
            learner: "ada".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_learner() {
        let cmd = command();
        let output = cmd.run(&options());
        assert!(output.success);
        assert_eq!(output.summary.as_ref().unwrap().history.len(), 7);
        assert!(cmd.format_output(&output, &options()).contains("No sessions"));
    }

    #[test]
    fn test_totals_and_history() {
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
                        correct: 8,
                        mistakes: Some(2),
                        elapsed_sec: 90.0,
                        ..Default::default()
                    },
                ),
            })
            .unwrap();

        let output = cmd.run(&options());
        let summary = output.summary.as_ref().unwrap();
        assert_eq!(summary.totals.total_problems, 10);
        assert_eq!(summary.active_days, 1);
        assert_eq!(summary.history.last().unwrap().successful_sessions, 1);

        let text = cmd.format_output(&output, &options());
        assert!(text.contains("Accuracy:         80.0%"));
        assert!(text.contains("1m 30s"));
    }

    #[test]
    fn test_invalid_learner() {
        let cmd = command();
        let output = cmd.run(&StatsOptions {
            learner: String::new(),
            ..Default::default()
        });
        assert!(!output.success);
        assert!(cmd
            .format_output(&output, &StatsOptions::default())
            .starts_with("Stats failed"));
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(3725), "1h 2m");
    }
}
