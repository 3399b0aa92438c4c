use serde::{Deserialize, Serialize};

/// How a finished trial ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialOutcome {
    Reaction { ms: f64 },
    FalseStart,
}

/// Recorded result per trial.
///
/// A record is either timed or a false start, never both. The constructors and
/// the deserializer both enforce that, so a `TrialRecord` in hand is always
/// well formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrialRow", into = "TrialRow")]
pub struct TrialRecord {
    index: usize,
    planned_delay_seconds: f64,
    outcome: TrialOutcome,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("trial indices are 1-based, got 0")]
    ZeroIndex,
    #[error("trial {index}: planned delay {seconds} s is not a positive finite number")]
    InvalidDelay { index: usize, seconds: f64 },
    #[error("trial {index}: reaction time {ms} ms is not a non-negative finite number")]
    InvalidReaction { index: usize, ms: f64 },
    #[error("trial {0} is flagged as a false start but carries a reaction time")]
    FalseStartWithReaction(usize),
    #[error("trial {0} has neither a reaction time nor a false start flag")]
    MissingReaction(usize),
    #[error("trial_count is {declared} but {actual} trials are listed")]
    CountMismatch { declared: usize, actual: usize },
    #[error("trial {found} is out of order, expected {expected}")]
    OutOfOrder { expected: usize, found: usize },
    #[error("{field} disagrees with the listed trials")]
    SummaryMismatch { field: &'static str },
}

impl TrialRecord {
    pub fn timed(index: usize, planned_delay_seconds: f64, ms: f64) -> Result<Self, RecordError> {
        Self::new(index, planned_delay_seconds, TrialOutcome::Reaction { ms })
    }

    pub fn false_start(index: usize, planned_delay_seconds: f64) -> Result<Self, RecordError> {
        Self::new(index, planned_delay_seconds, TrialOutcome::FalseStart)
    }

    pub fn new(
        index: usize,
        planned_delay_seconds: f64,
        outcome: TrialOutcome,
    ) -> Result<Self, RecordError> {
        if index == 0 {
            return Err(RecordError::ZeroIndex);
        }
        if !planned_delay_seconds.is_finite() || planned_delay_seconds <= 0.0 {
            return Err(RecordError::InvalidDelay {
                index,
                seconds: planned_delay_seconds,
            });
        }
        if let TrialOutcome::Reaction { ms } = outcome {
            if !ms.is_finite() || ms < 0.0 {
                return Err(RecordError::InvalidReaction { index, ms });
            }
        }
        Ok(Self {
            index,
            planned_delay_seconds,
            outcome,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn planned_delay_seconds(&self) -> f64 {
        self.planned_delay_seconds
    }

    pub fn outcome(&self) -> TrialOutcome {
        self.outcome
    }

    pub fn reaction_ms(&self) -> Option<f64> {
        match self.outcome {
            TrialOutcome::Reaction { ms } => Some(ms),
            TrialOutcome::FalseStart => None,
        }
    }

    pub fn is_false_start(&self) -> bool {
        matches!(self.outcome, TrialOutcome::FalseStart)
    }
}

/// Wire shape of one entry in the `trials` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrialRow {
    trial: usize,
    random_delay_seconds: f64,
    reaction_ms: Option<f64>,
    false_start: bool,
}

impl TryFrom<TrialRow> for TrialRecord {
    type Error = RecordError;

    fn try_from(row: TrialRow) -> Result<Self, Self::Error> {
        let outcome = match (row.false_start, row.reaction_ms) {
            (true, None) => TrialOutcome::FalseStart,
            (false, Some(ms)) => TrialOutcome::Reaction { ms },
            (true, Some(_)) => return Err(RecordError::FalseStartWithReaction(row.trial)),
            (false, None) => return Err(RecordError::MissingReaction(row.trial)),
        };
        TrialRecord::new(row.trial, row.random_delay_seconds, outcome)
    }
}

impl From<TrialRecord> for TrialRow {
    fn from(record: TrialRecord) -> Self {
        TrialRow {
            trial: record.index,
            random_delay_seconds: record.planned_delay_seconds,
            reaction_ms: record.reaction_ms(),
            false_start: record.is_false_start(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn false_start_serializes_null_reaction() {
        let record = TrialRecord::false_start(2, 1.25).unwrap();
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(
            value,
            json!({
                "trial": 2,
                "random_delay_seconds": 1.25,
                "reaction_ms": null,
                "false_start": true,
            })
        );
    }

    #[test]
    fn timed_record_exposes_reaction() {
        let record = TrialRecord::timed(1, 0.8, 212.5).unwrap();
        assert_eq!(record.reaction_ms(), Some(212.5));
        assert!(!record.is_false_start());
        assert_eq!(record.index(), 1);
    }

    #[test]
    fn rejects_zero_index_and_bad_numbers() {
        assert_eq!(
            TrialRecord::false_start(0, 1.0).unwrap_err(),
            RecordError::ZeroIndex
        );
        assert!(matches!(
            TrialRecord::false_start(1, 0.0),
            Err(RecordError::InvalidDelay { .. })
        ));
        assert!(matches!(
            TrialRecord::timed(1, 1.0, f64::NAN),
            Err(RecordError::InvalidReaction { .. })
        ));
    }

    #[test]
    fn deserializer_rejects_both_and_neither() {
        let both = json!({
            "trial": 1,
            "random_delay_seconds": 1.0,
            "reaction_ms": 200.0,
            "false_start": true,
        });
        let err = serde_json::from_value::<TrialRecord>(both).unwrap_err();
        assert!(err.to_string().contains("false start"));

        let neither = json!({
            "trial": 1,
            "random_delay_seconds": 1.0,
            "reaction_ms": null,
            "false_start": false,
        });
        assert!(serde_json::from_value::<TrialRecord>(neither).is_err());
    }
}
