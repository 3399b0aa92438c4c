//! Seams between the engine and whatever shows cues and reads responses.

use async_trait::async_trait;
use reflex_core::{Cue, TrialPhase};

use crate::error::DeviceError;

/// One event from an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSignal {
    /// A qualifying response (key or button press).
    Press,
    /// The participant asked to stop the run.
    Abort,
    /// The source is gone and will not produce more input.
    Closed,
}

/// Shows cues to the participant.
#[async_trait]
pub trait Presenter: Send {
    /// Puts `cue` on screen and resolves once it is visible. The reaction
    /// clock is started from this call, so implementations must not return
    /// early.
    async fn present(&mut self, cue: Cue) -> Result<(), DeviceError>;
}

/// Delivers participant input.
#[async_trait]
pub trait InputSource: Send {
    /// Waits for the next signal. Must be cancel safe: the monitor drops the
    /// future whenever the wait timer wins the race.
    async fn next_signal(&mut self) -> Result<InputSignal, DeviceError>;

    /// Told about every phase the live trial enters.
    fn on_phase(&mut self, _phase: TrialPhase) {}
}
