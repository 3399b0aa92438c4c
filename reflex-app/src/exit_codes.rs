//! Process exit codes. Anything other than `SUCCESS` means the output files
//! were not written and must not be read.

use reflex_engine::{AbortReason, EngineError};

pub const SUCCESS: i32 = 0;
/// Bad arguments, config file or run parameters.
pub const CONFIG_ERROR: i32 = 1;
/// A requested output file could not be written.
pub const OUTPUT_ERROR: i32 = 2;
/// The participant or a signal stopped the run.
pub const ABORTED: i32 = 3;
/// The input device went away mid-run.
pub const QUIT: i32 = 4;
/// A bug: an invariant the engine relies on did not hold.
pub const INTERNAL_ERROR: i32 = 70;

pub fn for_error(err: &EngineError) -> i32 {
    match err {
        EngineError::Config(_) => CONFIG_ERROR,
        EngineError::Output { .. } => OUTPUT_ERROR,
        EngineError::Aborted {
            reason: AbortReason::InputClosed,
            ..
        } => QUIT,
        EngineError::Aborted { .. } => ABORTED,
        EngineError::Device(_) => QUIT,
        EngineError::Transition(_) | EngineError::Record(_) | EngineError::Encode(_) => {
            INTERNAL_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex_engine::ConfigError;

    fn aborted(reason: AbortReason) -> EngineError {
        EngineError::Aborted {
            trial: 2,
            completed: 1,
            reason,
        }
    }

    #[test]
    fn codes_are_distinct_per_failure_class() {
        assert_eq!(
            for_error(&ConfigError::TrialCountNotPositive(0).into()),
            CONFIG_ERROR
        );
        assert_eq!(for_error(&aborted(AbortReason::Escape)), ABORTED);
        assert_eq!(for_error(&aborted(AbortReason::Cancelled)), ABORTED);
        assert_eq!(for_error(&aborted(AbortReason::InputClosed)), QUIT);
        assert_eq!(
            for_error(&EngineError::Encode("bad float".into())),
            INTERNAL_ERROR
        );
        assert_ne!(INTERNAL_ERROR, CONFIG_ERROR);
    }
}
