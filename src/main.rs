//! Abacus - Trainer Session Progression & Achievement Engine
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use abacus::cli::achievements::AchievementsOptions;
use abacus::cli::play::PlayOptions;
use abacus::cli::progress::ProgressOptions;
use abacus::cli::record::RecordOptions;
use abacus::cli::stats::StatsOptions;
use abacus::cli::trainers::TrainersOptions;
use abacus::config::{abacus_home, Config};
use abacus::core::{ConfigOverrides, RawOutcome};
use abacus::error::exit_codes;
use abacus::flow::{CachedProgressApi, ProgressCache};
use abacus::recording::{ProgressApi, Recorder};
use abacus::storage::{FileLearnerStore, MemoryLearnerStore};
use abacus::trainers::TrainerRegistry;
use abacus::{
    AchievementsCommand, PlayCommand, ProgressCommand, RecordCommand, StatsCommand,
    TrainersCommand,
};

// =============================================================================
// CLI Definition
// =============================================================================

/// Abacus - Trainer Session Progression & Achievement Engine
#[derive(Parser)]
#[command(name = "abacus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output flags shared by every command.
#[derive(Args, Debug, Clone, Copy, Default)]
struct OutputArgs {
    /// Output as JSON
    #[arg(long, short)]
    json: bool,
    /// Suppress output
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List trainers and their presets
    Trainers {
        /// Resolve preset locks for this learner
        #[arg(long)]
        learner: Option<String>,
        /// Only show this trainer
        #[arg(long)]
        trainer: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show a learner's progress on one trainer
    Progress {
        learner: String,
        trainer: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Record a finished run
    Record {
        learner: String,
        trainer: String,
        preset: String,
        /// Attempt token (retries with the same token are no-ops)
        #[arg(long)]
        token: Option<String>,
        /// Problems solved
        #[arg(long)]
        solved: u32,
        /// Problems posed (defaults to the preset's count)
        #[arg(long, default_value_t = 0)]
        total: u32,
        /// Mistakes made
        #[arg(long, default_value_t = 0)]
        mistakes: u32,
        /// Seconds spent
        #[arg(long)]
        elapsed: f64,
        /// Race result
        #[arg(long)]
        won: Option<bool>,
        /// Stars awarded by the runner
        #[arg(long)]
        stars: Option<u8>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Play one scripted run through the full session flow
    Play {
        learner: String,
        trainer: String,
        preset: String,
        /// Problems solved (defaults to all)
        #[arg(long)]
        solved: Option<u32>,
        /// Mistakes made
        #[arg(long, default_value_t = 0)]
        mistakes: u32,
        /// Seconds the run took
        #[arg(long, default_value_t = 60.0)]
        elapsed: f64,
        /// Race result (derived from the opponent clock when omitted)
        #[arg(long)]
        won: Option<bool>,
        /// Override the number of problems
        #[arg(long)]
        problems: Option<u32>,
        /// Override the time limit in seconds
        #[arg(long)]
        time_limit: Option<u32>,
        /// Override the opponent speed (problems per minute)
        #[arg(long)]
        opponent_ppm: Option<f64>,
        /// Use an in-memory store; nothing is saved
        #[arg(long)]
        ephemeral: bool,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List achievements with progress
    Achievements {
        learner: String,
        /// Only show unlocked achievements
        #[arg(long)]
        unlocked: bool,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show totals and the recent success history
    Stats {
        learner: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("abacus error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Install the stderr log subscriber. `ABACUS_LOG` takes an env-filter
/// directive; the default only shows warnings.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("ABACUS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.abacus/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("abacus panic: {}", info);

        if let Some(home) = abacus_home() {
            let _ = std::fs::create_dir_all(&home);
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let config = Config::load_from_cwd(&cwd);

    match cli.command {
        Commands::Trainers {
            learner,
            trainer,
            output,
        } => run_trainers(&config, learner, trainer, output),
        Commands::Progress {
            learner,
            trainer,
            output,
        } => run_progress(&config, learner, trainer, output),
        Commands::Record {
            learner,
            trainer,
            preset,
            token,
            solved,
            total,
            mistakes,
            elapsed,
            won,
            stars,
            output,
        } => {
            let outcome = RawOutcome {
                solved,
                total,
                mistakes,
                elapsed_sec: elapsed,
                won,
                stars,
            };
            run_record(&config, learner, trainer, preset, token, outcome, output)
        }
        Commands::Play {
            learner,
            trainer,
            preset,
            solved,
            mistakes,
            elapsed,
            won,
            problems,
            time_limit,
            opponent_ppm,
            ephemeral,
            output,
        } => {
            let options = PlayOptions {
                json: output.json,
                quiet: output.quiet,
                learner,
                trainer,
                preset,
                solved,
                mistakes,
                elapsed_sec: elapsed,
                won,
                overrides: ConfigOverrides {
                    problem_count: problems,
                    time_limit_sec: time_limit,
                    opponent_ppm,
                },
            };
            run_play(&config, options, ephemeral)
        }
        Commands::Achievements {
            learner,
            unlocked,
            output,
        } => run_achievements(&config, learner, unlocked, output),
        Commands::Stats { learner, output } => run_stats(&config, learner, output),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Build the progress API: a recorder over the learner store, behind the
/// progress cache.
fn open_api(
    config: &Config,
    registry: &TrainerRegistry,
    ephemeral: bool,
) -> Result<Arc<dyn ProgressApi>, Box<dyn std::error::Error>> {
    let cache = ProgressCache::from_config(&config.flow);
    if ephemeral {
        let recorder = Recorder::new(MemoryLearnerStore::new(), registry.clone(), config);
        return Ok(Arc::new(CachedProgressApi::new(recorder, cache)));
    }

    let dir = config
        .learners_dir()
        .ok_or("Could not determine learners directory")?;
    let store = FileLearnerStore::with_dir(dir)?;
    tracing::debug!(dir = %store.dir().display(), "using file learner store");
    let recorder = Recorder::new(store, registry.clone(), config);
    Ok(Arc::new(CachedProgressApi::new(recorder, cache)))
}

/// Print formatted output unless it is empty.
fn emit(formatted: String) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::OK as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn run_trainers(
    config: &Config,
    learner: Option<String>,
    trainer: Option<String>,
    output: OutputArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = TrainerRegistry::builtin();
    let api = open_api(config, &registry, false)?;
    let cmd = TrainersCommand::new(api, registry);
    let options = TrainersOptions {
        json: output.json,
        quiet: output.quiet,
        learner,
        trainer,
    };

    let result = cmd.run(&options);
    emit(cmd.format_output(&result, &options));
    Ok(success_to_exit_code(result.success))
}

fn run_progress(
    config: &Config,
    learner: String,
    trainer: String,
    output: OutputArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = TrainerRegistry::builtin();
    let api = open_api(config, &registry, false)?;
    let cmd = ProgressCommand::new(api, registry);
    let options = ProgressOptions {
        json: output.json,
        quiet: output.quiet,
        learner,
        trainer,
    };

    let result = cmd.run(&options);
    emit(cmd.format_output(&result, &options));
    Ok(success_to_exit_code(result.success))
}

fn run_record(
    config: &Config,
    learner: String,
    trainer: String,
    preset: String,
    token: Option<String>,
    outcome: RawOutcome,
    output: OutputArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = TrainerRegistry::builtin();
    let api = open_api(config, &registry, false)?;
    let cmd = RecordCommand::new(api, registry);
    let options = RecordOptions {
        json: output.json,
        quiet: output.quiet,
        learner,
        trainer,
        preset,
        token,
        outcome,
    };

    let result = cmd.run(&options);
    emit(cmd.format_output(&result, &options));
    Ok(success_to_exit_code(result.success))
}

fn run_play(
    config: &Config,
    options: PlayOptions,
    ephemeral: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = TrainerRegistry::builtin();
    let api = open_api(config, &registry, ephemeral)?;
    let cmd = PlayCommand::new(api, registry, config.flow.clone());

    let result = cmd.run(&options);
    emit(cmd.format_output(&result, &options));
    Ok(success_to_exit_code(result.success))
}

fn run_achievements(
    config: &Config,
    learner: String,
    unlocked_only: bool,
    output: OutputArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = TrainerRegistry::builtin();
    let cmd = AchievementsCommand::new(open_api(config, &registry, false)?);
    let options = AchievementsOptions {
        json: output.json,
        quiet: output.quiet,
        learner,
        unlocked_only,
    };

    let result = cmd.run(&options);
    emit(cmd.format_output(&result, &options));
    Ok(success_to_exit_code(result.success))
}

fn run_stats(
    config: &Config,
    learner: String,
    output: OutputArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = TrainerRegistry::builtin();
    let cmd = StatsCommand::new(open_api(config, &registry, false)?);
    let options = StatsOptions {
        json: output.json,
        quiet: output.quiet,
        learner,
    };

    let result = cmd.run(&options);
    emit(cmd.format_output(&result, &options));
    Ok(success_to_exit_code(result.success))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_record() {
        let cli = Cli::parse_from([
            "abacus",
            "record",
            "ada",
            "column-addition",
            "accuracy",
            "--solved",
            "10",
            "--elapsed",
            "42.5",
            "--token",
            "tok-1",
            "--json",
        ]);
        match cli.command {
            Commands::Record {
                learner,
                preset,
                solved,
                elapsed,
                token,
                total,
                output,
                ..
            } => {
                assert_eq!(learner, "ada");
                assert_eq!(preset, "accuracy");
                assert_eq!(solved, 10);
                assert_eq!(total, 0);
                assert_eq!(elapsed, 42.5);
                assert_eq!(token, Some("tok-1".to_string()));
                assert!(output.json);
            }
            _ => panic!("Expected Record command"),
        }
    }

    #[test]
    fn test_cli_parse_play() {
        let cli = Cli::parse_from([
            "abacus",
            "play",
            "ada",
            "times-tables",
            "race",
            "--won",
            "true",
            "--problems",
            "12",
            "--ephemeral",
            "-q",
        ]);
        match cli.command {
            Commands::Play {
                won,
                problems,
                ephemeral,
                elapsed,
                output,
                ..
            } => {
                assert_eq!(won, Some(true));
                assert_eq!(problems, Some(12));
                assert!(ephemeral);
                assert_eq!(elapsed, 60.0);
                assert!(output.quiet);
            }
            _ => panic!("Expected Play command"),
        }
    }

    #[test]
    fn test_cli_parse_trainers() {
        let cli = Cli::parse_from(["abacus", "trainers", "--learner", "ada"]);
        match cli.command {
            Commands::Trainers {
                learner, trainer, ..
            } => {
                assert_eq!(learner, Some("ada".to_string()));
                assert!(trainer.is_none());
            }
            _ => panic!("Expected Trainers command"),
        }
    }

    #[test]
    fn test_cli_parse_achievements() {
        let cli = Cli::parse_from(["abacus", "achievements", "ada", "--unlocked"]);
        match cli.command {
            Commands::Achievements {
                learner, unlocked, ..
            } => {
                assert_eq!(learner, "ada");
                assert!(unlocked);
            }
            _ => panic!("Expected Achievements command"),
        }
    }

    #[test]
    fn test_cli_parse_stats() {
        let cli = Cli::parse_from(["abacus", "stats", "ada", "--json"]);
        match cli.command {
            Commands::Stats { learner, output } => {
                assert_eq!(learner, "ada");
                assert!(output.json);
            }
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
