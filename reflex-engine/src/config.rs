use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Upper bound on trials per run.
pub const MAX_TRIALS: i64 = 1_000_000;

/// Upper bound on the maximum delay, one day. Keeps every deadline well
/// inside the nanosecond timestamps the timer hands out.
pub const MAX_DELAY_SECONDS: f64 = 86_400.0;

/// Run parameters as requested, before validation.
///
/// Deserializes from TOML with every field optional, so a config file may
/// override just the values it cares about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub min_delay_seconds: f64,
    pub max_delay_seconds: f64,
    pub trial_count: i64,
    /// Inputs this soon after arming are ignored instead of counting as false starts.
    pub false_start_grace_ms: f64,
    /// How far ahead of the go-cue the coarse sleep hands over to spinning.
    pub spin_margin_ms: f64,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            min_delay_seconds: 2.0,
            max_delay_seconds: 5.0,
            trial_count: 10,
            false_start_grace_ms: 0.0,
            spin_margin_ms: 2.0,
            seed: None,
        }
    }
}

/// What counts as a false start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FalseStartPolicy {
    /// Zero means any input before the go-cue is a false start.
    pub grace: Duration,
}

impl FalseStartPolicy {
    pub fn strict() -> Self {
        Self::default()
    }
}

/// Parameters that passed [`RunConfig::validate`]. Only these can drive a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    min_delay_seconds: f64,
    max_delay_seconds: f64,
    trial_count: usize,
    policy: FalseStartPolicy,
    spin_margin: Duration,
    seed: Option<u64>,
}

impl RunConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Checks every run parameter. Nothing runs unless this succeeds.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let min = self.min_delay_seconds;
        let max = self.max_delay_seconds;
        if !min.is_finite() || min <= 0.0 {
            return Err(ConfigError::MinDelayNotPositive(min));
        }
        if !max.is_finite() || max <= 0.0 {
            return Err(ConfigError::MaxDelayNotPositive(max));
        }
        if max > MAX_DELAY_SECONDS {
            return Err(ConfigError::MaxDelayTooLarge(max));
        }
        if min >= max {
            return Err(ConfigError::DelayRangeEmpty { min, max });
        }
        if self.trial_count <= 0 {
            return Err(ConfigError::TrialCountNotPositive(self.trial_count));
        }
        if self.trial_count > MAX_TRIALS {
            return Err(ConfigError::TrialCountTooLarge(self.trial_count));
        }
        let grace_ms = self.false_start_grace_ms;
        let grace = match Duration::try_from_secs_f64(grace_ms / 1000.0) {
            Ok(grace) if grace_ms / 1000.0 < min => grace,
            _ => return Err(ConfigError::GraceWindow { grace_ms }),
        };
        let spin_margin = Duration::try_from_secs_f64(self.spin_margin_ms / 1000.0)
            .map_err(|_| ConfigError::SpinMargin(self.spin_margin_ms))?;
        Ok(ValidatedConfig {
            min_delay_seconds: min,
            max_delay_seconds: max,
            trial_count: self.trial_count as usize,
            policy: FalseStartPolicy { grace },
            spin_margin,
            seed: self.seed,
        })
    }
}

impl ValidatedConfig {
    pub fn min_delay_seconds(&self) -> f64 {
        self.min_delay_seconds
    }

    pub fn max_delay_seconds(&self) -> f64 {
        self.max_delay_seconds
    }

    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    pub fn policy(&self) -> FalseStartPolicy {
        self.policy
    }

    pub fn spin_margin(&self) -> Duration {
        self.spin_margin
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}
