use std::io::IsTerminal;

use log::error;
use reflex_core::RunResult;
use reflex_engine::{DeviceError, EngineError, RecordingPresenter, RunController, ScriptedInput};
use reflex_term::{TerminalInput, TerminalPresenter, TerminalSession};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::exit_codes;
use crate::report;

/// One full run, on the terminal or against a response script.
///
/// The terminal is back in its normal state by the time this returns.
pub async fn run_session(
    controller: &RunController,
    script: Option<&mut ScriptedInput>,
    cancel: &CancellationToken,
) -> Result<RunResult, EngineError> {
    match script {
        Some(input) => {
            let mut presenter = RecordingPresenter::default();
            controller.run(&mut presenter, input, cancel).await
        }
        None => {
            let session = TerminalSession::enter().map_err(DeviceError::Present)?;
            let mut presenter = TerminalPresenter::stdout();
            let mut input = TerminalInput::new();
            let result = controller.run(&mut presenter, &mut input, cancel).await;
            drop(session);
            result
        }
    }
}

/// Refuses a live run without a terminal to draw on. Scripted runs need none.
pub fn ensure_script_or_tty(cli: &Cli) -> anyhow::Result<()> {
    if cli.simulate.is_none() && !std::io::stdout().is_terminal() {
        anyhow::bail!("a live run needs a terminal; pass --simulate for a scripted run");
    }
    Ok(())
}

/// `--run-once`: a single pass with no prompts. Returns the exit code.
pub async fn execute(cli: &Cli, cancel: &CancellationToken) -> i32 {
    let config = match cli.run_config().and_then(|config| config.validate()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::CONFIG_ERROR;
        }
    };
    let mut script = match cli.simulate.as_deref().map(ScriptedInput::parse).transpose() {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error: invalid --simulate script: {}", e);
            return exit_codes::CONFIG_ERROR;
        }
    };

    let controller = RunController::new(config);
    let result = match run_session(&controller, script.as_mut(), cancel).await {
        Ok(result) => result,
        Err(e) => return report_failure(&e),
    };
    print!("{}", report::render(&result));

    match cli.output_targets().write_all(&result) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

/// Prints a failed run to stderr and picks its exit code.
pub fn report_failure(err: &EngineError) -> i32 {
    if err.is_internal() {
        error!("internal fault: {:?}", err);
    }
    match err.abort_reason() {
        Some(_) => eprintln!("\nRun aborted: {}", err),
        None => eprintln!("Error: {}", err),
    }
    exit_codes::for_error(err)
}
