//! Unified error types for Abacus.
//!
//! Errors fall into a small taxonomy: validation failures are rejected before
//! anything touches the ledger, storage failures are recoverable and surfaced
//! as warnings by the session flow, and state errors mark invalid flow
//! transitions. A duplicate recording is not an error at all.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Abacus operations.
#[derive(Error, Debug)]
pub enum AbacusError {
    /// I/O errors from learner document operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Malformed or out-of-range configuration, metrics or identifiers.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Flow state machine violations (invalid transitions).
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Trainer id not present in the registry.
    #[error("unknown trainer: {trainer_id}")]
    UnknownTrainer { trainer_id: String },

    /// Preset id not offered by the trainer.
    #[error("unknown preset {preset_id} for trainer {trainer_id}")]
    UnknownPreset {
        trainer_id: String,
        preset_id: String,
    },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Persistence temporarily unavailable (timeouts, lock poisoning).
    #[error("transient error: {message}")]
    Transient { message: String },
}

/// A specialized Result type for Abacus operations.
pub type Result<T> = std::result::Result<T, AbacusError>;

impl AbacusError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an unknown trainer error.
    pub fn unknown_trainer(trainer_id: impl Into<String>) -> Self {
        Self::UnknownTrainer {
            trainer_id: trainer_id.into(),
        }
    }

    /// Create an unknown preset error.
    pub fn unknown_preset(trainer_id: impl Into<String>, preset_id: impl Into<String>) -> Self {
        Self::UnknownPreset {
            trainer_id: trainer_id.into(),
            preset_id: preset_id.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Whether a later retry of the same call may succeed.
    ///
    /// Storage and transient failures are recoverable; the client keeps its
    /// locally known result and resyncs later. Validation and state errors
    /// will fail the same way again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Transient { .. })
    }
}

impl From<io::Error> for AbacusError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AbacusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Used where a failure must not block the learner: log a warning and carry
/// on with a safe value.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the Abacus CLI.
pub mod exit_codes {
    /// Command succeeded.
    pub const OK: i32 = 0;

    /// Command failed.
    pub const ERROR: i32 = 1;

    /// Process panicked.
    pub const CRASH: i32 = 3;
}
