use crate::TrialPhase;

/// What the participant sees during a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Dark field shown while the trial is armed.
    Hold,
    /// Bright field; its onset starts the reaction clock.
    Go,
}

impl Cue {
    /// RGBA fill for this cue.
    pub fn color(&self) -> [u8; 4] {
        match self {
            Cue::Hold => [0, 0, 0, 255],
            Cue::Go => [255, 255, 255, 255],
        }
    }

    pub fn for_phase(phase: TrialPhase) -> Self {
        if phase.shows_stimulus() {
            Cue::Go
        } else {
            Cue::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stimulus_phase_shows_go() {
        assert_eq!(Cue::for_phase(TrialPhase::StimulusPresented), Cue::Go);
        assert_eq!(Cue::for_phase(TrialPhase::ArmedWait), Cue::Hold);
        assert_eq!(Cue::for_phase(TrialPhase::Completed), Cue::Hold);
    }
}
