use std::path::PathBuf;

use reflex_core::{RecordError, TransitionError};
use thiserror::Error;

/// Rejected run parameters. Raised before any trial starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("minimum delay must be a positive number of seconds, got {0}")]
    MinDelayNotPositive(f64),

    #[error("maximum delay must be a positive number of seconds, got {0}")]
    MaxDelayNotPositive(f64),

    #[error("maximum delay {0} s exceeds the limit of {limit} s", limit = crate::config::MAX_DELAY_SECONDS)]
    MaxDelayTooLarge(f64),

    #[error("minimum delay {min} s must be below maximum delay {max} s")]
    DelayRangeEmpty { min: f64, max: f64 },

    #[error("trial count must be at least 1, got {0}")]
    TrialCountNotPositive(i64),

    #[error("trial count {0} exceeds the limit of {limit}", limit = crate::config::MAX_TRIALS)]
    TrialCountTooLarge(i64),

    #[error("false-start grace window {grace_ms} ms must be non-negative and shorter than the minimum delay")]
    GraceWindow { grace_ms: f64 },

    #[error("spin margin {0} ms must be a non-negative number")]
    SpinMargin(f64),

    #[error("failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failure reported by a presenter or input source.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("presentation failed: {0}")]
    Present(#[source] std::io::Error),

    #[error("input failed: {0}")]
    Input(#[source] std::io::Error),
}

/// Why a live trial was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Run-wide cancellation token fired.
    Cancelled,
    /// Participant pressed the abort key.
    Escape,
    /// Input source went away (terminal closed, script exhausted).
    InputClosed,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("run aborted during trial {trial} after {completed} completed trials ({reason:?})")]
    Aborted {
        trial: usize,
        completed: usize,
        reason: AbortReason,
    },

    #[error("trial state machine fault: {0}")]
    Transition(#[from] TransitionError),

    #[error("malformed trial record: {0}")]
    Record(#[from] RecordError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode run result: {0}")]
    Encode(String),
}

impl EngineError {
    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self {
            EngineError::Aborted { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Faults that indicate a bug rather than bad input or a user action.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            EngineError::Transition(_) | EngineError::Record(_) | EngineError::Encode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
