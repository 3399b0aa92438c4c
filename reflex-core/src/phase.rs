/// States of a single trial's timing window.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum TrialPhase {
    /// Wait timer running, input already counts.
    ArmedWait,
    /// Go-cue on screen, reaction clock running.
    StimulusPresented,
    FalseStart,
    Completed,
    Aborted,
}

impl Default for TrialPhase {
    fn default() -> Self {
        TrialPhase::ArmedWait
    }
}

/// Things that can happen to a live trial.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    WaitElapsed,
    Input,
    Cancelled,
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no transition from {from:?} on {event:?}")]
pub struct TransitionError {
    pub from: TrialPhase,
    pub event: PhaseEvent,
}

impl TrialPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FalseStart | Self::Completed | Self::Aborted)
    }

    pub fn shows_stimulus(&self) -> bool {
        matches!(self, Self::StimulusPresented)
    }

    /// Applies `event`, rejecting anything the trial state machine does not allow.
    pub fn next(&self, event: PhaseEvent) -> Result<Self, TransitionError> {
        use TrialPhase::*;
        Ok(match (self, event) {
            (ArmedWait, PhaseEvent::WaitElapsed) => StimulusPresented,
            (ArmedWait, PhaseEvent::Input) => FalseStart,
            (StimulusPresented, PhaseEvent::Input) => Completed,
            (ArmedWait | StimulusPresented, PhaseEvent::Cancelled) => Aborted,
            _ => return Err(TransitionError { from: *self, event }),
        })
    }
}
