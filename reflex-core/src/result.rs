use serde::{Deserialize, Serialize};

use crate::trial::{RecordError, TrialRecord};

/// Slack allowed when re-checking a stored average. Records written with six
/// decimals round each reaction time independently.
const AVERAGE_TOLERANCE_MS: f64 = 1e-3;

/// Summary statistics over a set of trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub trial_count: usize,
    pub valid_count: usize,
    pub false_start_count: usize,
    /// Mean over timed trials only; `None` when every trial was a false start.
    pub average_reaction_ms: Option<f64>,
}

impl Summary {
    pub fn from_records(records: &[TrialRecord]) -> Self {
        let (total, valid_count) = records
            .iter()
            .filter_map(TrialRecord::reaction_ms)
            .fold((0.0, 0usize), |(sum, n), ms| (sum + ms, n + 1));
        let average_reaction_ms = if valid_count > 0 {
            Some(total / valid_count as f64)
        } else {
            None
        };
        Self {
            trial_count: records.len(),
            valid_count,
            false_start_count: records.len() - valid_count,
            average_reaction_ms,
        }
    }
}

/// The full, finalized record of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RunRecord", into = "RunRecord")]
pub struct RunResult {
    summary: Summary,
    trials: Vec<TrialRecord>,
}

impl RunResult {
    /// Finalizes `trials`, which must be numbered 1..=n in order.
    pub fn from_trials(trials: Vec<TrialRecord>) -> Result<Self, RecordError> {
        check_order(&trials)?;
        Ok(Self {
            summary: Summary::from_records(&trials),
            trials,
        })
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    pub fn trial_count(&self) -> usize {
        self.summary.trial_count
    }

    pub fn valid_count(&self) -> usize {
        self.summary.valid_count
    }

    pub fn false_start_count(&self) -> usize {
        self.summary.false_start_count
    }

    pub fn average_reaction_ms(&self) -> Option<f64> {
        self.summary.average_reaction_ms
    }
}

fn check_order(trials: &[TrialRecord]) -> Result<(), RecordError> {
    for (pos, trial) in trials.iter().enumerate() {
        if trial.index() != pos + 1 {
            return Err(RecordError::OutOfOrder {
                expected: pos + 1,
                found: trial.index(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunRecord {
    trial_count: usize,
    valid_count: usize,
    false_start_count: usize,
    average_reaction_ms: Option<f64>,
    trials: Vec<TrialRecord>,
}

impl TryFrom<RunRecord> for RunResult {
    type Error = RecordError;

    fn try_from(record: RunRecord) -> Result<Self, Self::Error> {
        if record.trial_count != record.trials.len() {
            return Err(RecordError::CountMismatch {
                declared: record.trial_count,
                actual: record.trials.len(),
            });
        }
        let result = RunResult::from_trials(record.trials)?;
        let summary = result.summary;
        if summary.valid_count != record.valid_count {
            return Err(RecordError::SummaryMismatch {
                field: "valid_count",
            });
        }
        if summary.false_start_count != record.false_start_count {
            return Err(RecordError::SummaryMismatch {
                field: "false_start_count",
            });
        }
        let average_matches = match (summary.average_reaction_ms, record.average_reaction_ms) {
            (None, None) => true,
            (Some(expected), Some(stored)) => (expected - stored).abs() <= AVERAGE_TOLERANCE_MS,
            _ => false,
        };
        if !average_matches {
            return Err(RecordError::SummaryMismatch {
                field: "average_reaction_ms",
            });
        }
        Ok(result)
    }
}

impl From<RunResult> for RunRecord {
    fn from(result: RunResult) -> Self {
        RunRecord {
            trial_count: result.summary.trial_count,
            valid_count: result.summary.valid_count,
            false_start_count: result.summary.false_start_count,
            average_reaction_ms: result.summary.average_reaction_ms,
            trials: result.trials,
        }
    }
}
