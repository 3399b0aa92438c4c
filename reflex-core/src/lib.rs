pub mod phase;
pub mod result;
pub mod stimulus;
pub mod trial;

pub use phase::{PhaseEvent, TransitionError, TrialPhase};
pub use result::{RunResult, Summary};
pub use stimulus::Cue;
pub use trial::{RecordError, TrialOutcome, TrialRecord};
