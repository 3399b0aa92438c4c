use std::time::Duration;

use log::{debug, info};
use reflex_core::{Cue, PhaseEvent, TrialPhase};
use reflex_timing::{Timer, sleep_until_precise};
use tokio_util::sync::CancellationToken;

use crate::config::FalseStartPolicy;
use crate::device::{InputSignal, InputSource, Presenter};
use crate::error::{AbortReason, Result};

/// How one trial's timing window ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorOutcome {
    Reaction { ms: f64 },
    FalseStart,
    /// Torn down before a response. Never recorded as a trial.
    Aborted(AbortReason),
}

/// Runs the timing window of a single trial: armed wait, go-cue, response.
///
/// Each phase is a race between event sources resolved with `select!`: the
/// cancellation token, the input source, and (while armed) the wait timer.
/// Whichever resolves first wins and the other futures are dropped.
pub struct StimulusMonitor<T: Timer<Timestamp = u64>> {
    timer: T,
    policy: FalseStartPolicy,
    spin_margin: Duration,
    phase: TrialPhase,
}

impl<T: Timer<Timestamp = u64>> StimulusMonitor<T> {
    pub fn new(timer: T, policy: FalseStartPolicy, spin_margin: Duration) -> Self {
        Self {
            timer,
            policy,
            spin_margin,
            phase: TrialPhase::default(),
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn into_timer(self) -> T {
        self.timer
    }

    pub async fn run_trial<P, I>(
        &mut self,
        planned_delay: Duration,
        presenter: &mut P,
        input: &mut I,
        cancel: &CancellationToken,
    ) -> Result<MonitorOutcome>
    where
        P: Presenter + ?Sized,
        I: InputSource + ?Sized,
    {
        self.phase = TrialPhase::ArmedWait;
        presenter.present(Cue::for_phase(self.phase)).await?;
        let armed_at = self.timer.now();
        input.on_phase(self.phase);
        let deadline = self.timer.offset(armed_at, planned_delay);
        let grace_end = self.timer.offset(armed_at, self.policy.grace);
        debug!("armed at {} ns, go-cue due at {} ns", armed_at, deadline);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return self.abort(input, AbortReason::Cancelled);
                }

                signal = input.next_signal() => match signal? {
                    InputSignal::Press => {
                        if self.timer.now() < grace_end {
                            debug!(
                                "ignoring input {:?} after arming (grace window)",
                                self.timer.elapsed(armed_at)
                            );
                            continue;
                        }
                        self.enter(PhaseEvent::Input, input)?;
                        info!("  False start: input before stimulus.");
                        return Ok(MonitorOutcome::FalseStart);
                    }
                    InputSignal::Abort => return self.abort(input, AbortReason::Escape),
                    InputSignal::Closed => return self.abort(input, AbortReason::InputClosed),
                },

                _ = sleep_until_precise(&self.timer, deadline, self.spin_margin) => break,
            }
        }

        self.phase = self.phase.next(PhaseEvent::WaitElapsed)?;
        let before = self.timer.now();
        presenter.present(Cue::for_phase(self.phase)).await?;
        let after = self.timer.now();
        // A vsync-blocking present returns somewhere inside the frame; take the midpoint.
        let onset = before + (after - before) / 2;
        self.timer.record_frame(Duration::from_nanos(after - before));
        input.on_phase(self.phase);
        debug!(
            "go-cue shown {:.3} ms late, present took {:.3} ms",
            to_millis(onset.saturating_sub(deadline)),
            to_millis(after - before)
        );

        tokio::select! {
            biased;

            _ = cancel.cancelled() => self.abort(input, AbortReason::Cancelled),

            signal = input.next_signal() => match signal? {
                InputSignal::Press => {
                    let at = self.timer.now();
                    self.enter(PhaseEvent::Input, input)?;
                    let ms = to_millis(at.saturating_sub(onset));
                    info!("  Reaction: {:.3} ms", ms);
                    Ok(MonitorOutcome::Reaction { ms })
                }
                InputSignal::Abort => self.abort(input, AbortReason::Escape),
                InputSignal::Closed => self.abort(input, AbortReason::InputClosed),
            },
        }
    }

    fn enter<I: InputSource + ?Sized>(&mut self, event: PhaseEvent, input: &mut I) -> Result<()> {
        let next = self.phase.next(event)?;
        debug!("trial phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        input.on_phase(next);
        Ok(())
    }

    fn abort<I: InputSource + ?Sized>(
        &mut self,
        input: &mut I,
        reason: AbortReason,
    ) -> Result<MonitorOutcome> {
        self.enter(PhaseEvent::Cancelled, input)?;
        info!("trial aborted ({:?})", reason);
        Ok(MonitorOutcome::Aborted(reason))
    }
}

fn to_millis(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}
