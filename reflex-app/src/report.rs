use std::fmt::Write;

use reflex_core::{RunResult, TrialOutcome};

/// Human-readable summary printed after a completed run.
pub fn render(result: &RunResult) -> String {
    let mut out = String::from("\n=== Results ===\n");
    for trial in result.trials() {
        let _ = match trial.outcome() {
            TrialOutcome::Reaction { ms } => writeln!(
                out,
                "Trial {}: delay={:.3} s, reaction={:.3} ms",
                trial.index(),
                trial.planned_delay_seconds(),
                ms
            ),
            TrialOutcome::FalseStart => writeln!(
                out,
                "Trial {}: delay={:.3} s, FALSE START",
                trial.index(),
                trial.planned_delay_seconds()
            ),
        };
    }
    if let Some(avg) = result.average_reaction_ms() {
        let _ = writeln!(out, "Average reaction (valid only): {:.3} ms", avg);
    }
    let _ = writeln!(
        out,
        "Valid trials: {}, false starts: {}",
        result.valid_count(),
        result.false_start_count()
    );
    out.push_str("================\n");
    out
}
