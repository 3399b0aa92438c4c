use log::{info, warn};
use reflex_core::RunResult;
use reflex_timing::{HighPrecisionTimer, PriorityGuard, Timer};
use tokio_util::sync::CancellationToken;

use crate::config::ValidatedConfig;
use crate::delay::DelayGenerator;
use crate::device::{InputSource, Presenter};
use crate::error::Result;
use crate::output::OutputTargets;
use crate::sequencer::TrialSequencer;

/// Owns one run from validated parameters to the written record.
///
/// A run that does not complete every trial produces no output at all.
pub struct RunController {
    config: ValidatedConfig,
}

impl RunController {
    pub fn new(config: ValidatedConfig) -> Self {
        Self { config }
    }

    pub async fn run<P, I>(
        &self,
        presenter: &mut P,
        input: &mut I,
        cancel: &CancellationToken,
    ) -> Result<RunResult>
    where
        P: Presenter + ?Sized,
        I: InputSource + ?Sized,
    {
        let priority = PriorityGuard::raise();
        if !priority.is_active() {
            warn!("could not raise process priority, timing may be noisier");
        }

        let delays = DelayGenerator::from_seed(self.config.seed());
        let sequencer = TrialSequencer::new(self.config.clone(), delays, HighPrecisionTimer::new());
        let (results, timer) = sequencer.run(presenter, input, cancel).await?;
        drop(priority);

        let stats = timer.frame_stats();
        if stats.samples > 0 {
            info!(
                "go-cue present: avg {:.3} ms, jitter {:.3} ms, max {:.3} ms over {} trials",
                stats.average_frame_time_ns / 1e6,
                stats.jitter_ns / 1e6,
                stats.max_frame_time_ns / 1e6,
                stats.samples
            );
        }

        let result = results.finish()?;
        info!(
            "run complete: {} valid, {} false starts",
            result.valid_count(),
            result.false_start_count()
        );
        Ok(result)
    }

    /// Runs to completion, then writes every requested output.
    pub async fn run_to<P, I>(
        &self,
        outputs: &OutputTargets,
        presenter: &mut P,
        input: &mut I,
        cancel: &CancellationToken,
    ) -> Result<RunResult>
    where
        P: Presenter + ?Sized,
        I: InputSource + ?Sized,
    {
        let result = self.run(presenter, input, cancel).await?;
        outputs.write_all(&result)?;
        Ok(result)
    }
}
