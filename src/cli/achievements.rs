//! Achievements command for Abacus.

use serde::Serialize;

use crate::recording::ProgressApi;
use crate::stats::{AchievementKind, AchievementView};

/// Options for the achievements command.
#[derive(Debug, Clone, Default)]
pub struct AchievementsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    pub learner: String,
    /// Only list unlocked achievements.
    pub unlocked_only: bool,
}

/// Output format for the achievements command.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementsOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub achievements: Vec<AchievementView>,
    pub unlocked: usize,
    pub total: usize,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AchievementsOutput {
    pub fn success(all: Vec<AchievementView>, unlocked_only: bool) -> Self {
        let total = all.len();
        let unlocked = all.iter().filter(|a| a.unlocked_at.is_some()).count();
        let achievements = if unlocked_only {
            all.into_iter().filter(|a| a.unlocked_at.is_some()).collect()
        } else {
            all
        };
        Self {
            success: true,
            achievements,
            unlocked,
            total,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            achievements: Vec::new(),
            unlocked: 0,
            total: 0,
            error: Some(error.into()),
        }
    }
}

/// The achievements command implementation.
pub struct AchievementsCommand<A: ProgressApi> {
    api: A,
}

impl<A: ProgressApi> AchievementsCommand<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Run the achievements command.
    pub fn run(&self, options: &AchievementsOptions) -> AchievementsOutput {
        match self.api.load_achievements(&options.learner) {
            Ok(views) => AchievementsOutput::success(views, options.unlocked_only),
            Err(e) => AchievementsOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(
        &self,
        output: &AchievementsOutput,
        options: &AchievementsOptions,
    ) -> String {
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

fn format_human_readable(output: &AchievementsOutput) -> String {
    if !output.success {
        return format!(
            "Achievements failed: {}",
            output.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut lines = vec![format!(
        "Achievements ({}/{} unlocked):",
        output.unlocked, output.total
    )];
    lines.push(String::new());

    for view in &output.achievements {
        let status = match (&view.unlocked_at, &view.kind) {
            (Some(at), _) => format!("unlocked {}", at.format("%Y-%m-%d")),
            (None, AchievementKind::Counter { .. }) => {
                format!("{}/{}", view.progress.min(view.total), view.total)
            }
            (None, AchievementKind::Boolean { .. }) => "locked".to_string(),
        };
        lines.push(format!("  {} {:<22} {}", view.icon, view.title, status));
        lines.push(format!("      {}", view.description));
    }
    lines.join("\n")
}
