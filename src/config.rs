//! Configuration loading for Abacus.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.abacus/config.toml`)
//! 3. User config (`~/.abacus/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The engine runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AbacusError, Result};

/// Main configuration struct for Abacus.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where learner documents live.
    pub storage: StorageConfig,
    /// Recording protocol behavior.
    pub recording: RecordingConfig,
    /// Client-side session flow behavior.
    pub flow: FlowConfig,
    /// Stats summary configuration.
    pub stats: StatsConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for learner documents. Defaults to `<abacus_home>/learners`.
    pub data_dir: Option<String>,
}

/// Recording protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordingConfig {
    /// Reject recordings that carry no attempt token.
    pub require_token: bool,
    /// Whether training presets still add to stats and achievements.
    pub training_feeds_stats: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            require_token: false,
            training_feeds_stats: true,
        }
    }
}

/// Session flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
    /// Freshness window of the client progress cache.
    pub progress_cache_ttl_seconds: u64,
    /// Budget for one persistence call before it counts as transient failure.
    pub persistence_timeout_ms: u64,
}

/// Upper bound for the cache TTL (one day).
pub const MAX_CACHE_TTL_SECONDS: u64 = 86_400;

impl FlowConfig {
    /// Check if a cache TTL is valid (at most one day).
    pub fn is_valid_cache_ttl(value: u64) -> bool {
        value <= MAX_CACHE_TTL_SECONDS
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            progress_cache_ttl_seconds: 30,
            persistence_timeout_ms: 5_000,
        }
    }
}

/// Stats summary configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// Number of days in the success histogram.
    pub history_days: u32,
}

/// Minimum and maximum histogram window.
pub const MIN_HISTORY_DAYS: u32 = 1;
pub const MAX_HISTORY_DAYS: u32 = 366;

impl StatsConfig {
    /// Check if a history window is valid.
    pub fn is_valid_history_days(value: u32) -> bool {
        (MIN_HISTORY_DAYS..=MAX_HISTORY_DAYS).contains(&value)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { history_days: 7 }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.abacus/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = abacus_home()?;
        Self::load_from_file(&home.join("config.toml")).ok()
    }

    /// Load project config from `.abacus/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let config_path = cwd.join(".abacus").join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load config from a specific file path.
    fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| AbacusError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| AbacusError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // ABACUS_DATA_DIR
        if let Ok(val) = env::var("ABACUS_DATA_DIR") {
            if val.is_empty() {
                tracing::warn!("ABACUS_DATA_DIR is empty, ignoring");
            } else {
                self.storage.data_dir = Some(val);
            }
        }

        // ABACUS_REQUIRE_TOKEN
        if let Ok(val) = env::var("ABACUS_REQUIRE_TOKEN") {
            self.recording.require_token = val == "true" || val == "1";
        }

        // ABACUS_TRAINING_FEEDS_STATS
        if let Ok(val) = env::var("ABACUS_TRAINING_FEEDS_STATS") {
            self.recording.training_feeds_stats = val == "true" || val == "1";
        }

        // ABACUS_CACHE_TTL_SECONDS
        if let Ok(val) = env::var("ABACUS_CACHE_TTL_SECONDS") {
            match val.parse::<u64>() {
                Ok(n) if FlowConfig::is_valid_cache_ttl(n) => {
                    self.flow.progress_cache_ttl_seconds = n;
                }
                Ok(n) => tracing::warn!(
                    "Invalid ABACUS_CACHE_TTL_SECONDS value '{}'. Must be <= {}. Using '{}'.",
                    n,
                    MAX_CACHE_TTL_SECONDS,
                    self.flow.progress_cache_ttl_seconds
                ),
                Err(_) => tracing::warn!(
                    "Invalid ABACUS_CACHE_TTL_SECONDS value '{}'. Expected a non-negative integer. Using '{}'.",
                    val,
                    self.flow.progress_cache_ttl_seconds
                ),
            }
        }

        // ABACUS_HISTORY_DAYS
        if let Ok(val) = env::var("ABACUS_HISTORY_DAYS") {
            match val.parse::<u32>() {
                Ok(n) if StatsConfig::is_valid_history_days(n) => self.stats.history_days = n,
                Ok(n) => tracing::warn!(
                    "Invalid ABACUS_HISTORY_DAYS value '{}'. Must be in [{}, {}]. Using '{}'.",
                    n,
                    MIN_HISTORY_DAYS,
                    MAX_HISTORY_DAYS,
                    self.stats.history_days
                ),
                Err(_) => tracing::warn!(
                    "Invalid ABACUS_HISTORY_DAYS value '{}'. Expected a positive integer. Using '{}'.",
                    val,
                    self.stats.history_days
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field. A value equal to
    /// the default cannot override a non-default value from a lower layer.
    fn merge(mut self, other: Config) -> Self {
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }

        let default_recording = RecordingConfig::default();
        if other.recording.require_token != default_recording.require_token {
            self.recording.require_token = other.recording.require_token;
        }
        if other.recording.training_feeds_stats != default_recording.training_feeds_stats {
            self.recording.training_feeds_stats = other.recording.training_feeds_stats;
        }

        let default_flow = FlowConfig::default();
        let ttl = other.flow.progress_cache_ttl_seconds;
        if ttl != default_flow.progress_cache_ttl_seconds {
            if FlowConfig::is_valid_cache_ttl(ttl) {
                self.flow.progress_cache_ttl_seconds = ttl;
            } else {
                tracing::warn!(
                    "Invalid progress_cache_ttl_seconds '{}' in config file. Must be <= {}. Using '{}'.",
                    ttl,
                    MAX_CACHE_TTL_SECONDS,
                    self.flow.progress_cache_ttl_seconds
                );
            }
        }
        if other.flow.persistence_timeout_ms != default_flow.persistence_timeout_ms {
            self.flow.persistence_timeout_ms = other.flow.persistence_timeout_ms;
        }

        let days = other.stats.history_days;
        if days != StatsConfig::default().history_days {
            if StatsConfig::is_valid_history_days(days) {
                self.stats.history_days = days;
            } else {
                tracing::warn!(
                    "Invalid history_days '{}' in config file. Must be in [{}, {}]. Using '{}'.",
                    days,
                    MIN_HISTORY_DAYS,
                    MAX_HISTORY_DAYS,
                    self.stats.history_days
                );
            }
        }

        self
    }

    /// Resolve the learner documents directory.
    pub fn learners_dir(&self) -> Option<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Some(PathBuf::from(dir)),
            None => learners_dir(),
        }
    }
}

/// Get the Abacus home directory.
///
/// Checks `ABACUS_HOME` first, then falls back to `~/.abacus`.
pub fn abacus_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("ABACUS_HOME") {
        if home.is_empty() {
            tracing::warn!("ABACUS_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("ABACUS_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".abacus"));
    }

    let fallback = env::temp_dir().join("abacus");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback.display()
    );
    Some(fallback)
}

/// Default learner documents directory: `<abacus_home>/learners/`.
pub fn learners_dir() -> Option<PathBuf> {
    abacus_home().map(|h| h.join("learners"))
}
