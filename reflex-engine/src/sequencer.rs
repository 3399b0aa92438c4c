use std::time::Duration;

use log::info;
use rand::Rng;
use reflex_core::TrialRecord;
use reflex_timing::Timer;
use tokio_util::sync::CancellationToken;

use crate::aggregate::ResultAggregator;
use crate::config::ValidatedConfig;
use crate::delay::DelayGenerator;
use crate::device::{InputSource, Presenter};
use crate::error::{EngineError, Result};
use crate::monitor::{MonitorOutcome, StimulusMonitor};

/// Drives the trials of one run, one at a time.
///
/// Trial `k + 1` is not armed until trial `k` has reached a terminal phase.
/// False starts are recorded and the run moves on; an aborted trial ends the
/// run without a record.
pub struct TrialSequencer<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    config: ValidatedConfig,
    delays: DelayGenerator<R>,
    monitor: StimulusMonitor<T>,
    results: ResultAggregator,
}

impl<T, R> TrialSequencer<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(config: ValidatedConfig, delays: DelayGenerator<R>, timer: T) -> Self {
        let monitor = StimulusMonitor::new(timer, config.policy(), config.spin_margin());
        let results = ResultAggregator::with_capacity(config.trial_count());
        Self {
            config,
            delays,
            monitor,
            results,
        }
    }

    /// Runs every trial in order and hands back the collected records.
    pub async fn run<P, I>(
        mut self,
        presenter: &mut P,
        input: &mut I,
        cancel: &CancellationToken,
    ) -> Result<(ResultAggregator, T)>
    where
        P: Presenter + ?Sized,
        I: InputSource + ?Sized,
    {
        let total = self.config.trial_count();
        for index in 1..=total {
            let delay = self.delays.next(
                self.config.min_delay_seconds(),
                self.config.max_delay_seconds(),
            );
            info!("Trial {}/{}: waiting {:.3} s", index, total, delay);

            let outcome = self
                .monitor
                .run_trial(Duration::from_secs_f64(delay), presenter, input, cancel)
                .await?;
            let record = match outcome {
                MonitorOutcome::Reaction { ms } => TrialRecord::timed(index, delay, ms)?,
                MonitorOutcome::FalseStart => TrialRecord::false_start(index, delay)?,
                MonitorOutcome::Aborted(reason) => {
                    return Err(EngineError::Aborted {
                        trial: index,
                        completed: self.results.len(),
                        reason,
                    });
                }
            };
            self.results.add(record);
        }
        Ok((self.results, self.monitor.into_timer()))
    }
}
