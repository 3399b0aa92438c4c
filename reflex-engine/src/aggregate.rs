use reflex_core::{RunResult, Summary, TrialRecord};

use crate::error::Result;

/// Collects trial records as a run progresses.
///
/// `summarize` reflects whatever has been added so far. Calling it before the
/// last trial is allowed; the controller only finalizes once the sequence is
/// complete.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    records: Vec<TrialRecord>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(trials: usize) -> Self {
        Self {
            records: Vec::with_capacity(trials),
        }
    }

    pub fn add(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn summarize(&self) -> Summary {
        Summary::from_records(&self.records)
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the aggregator into a finalized result.
    pub fn finish(self) -> Result<RunResult> {
        Ok(RunResult::from_trials(self.records)?)
    }
}
