//! Menu-driven mode used when `--run-once` is not given.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use reflex_engine::{AbortReason, EngineError, RunConfig, RunController, ScriptedInput, output};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::exit_codes;
use crate::report;
use crate::run::{report_failure, run_session};

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Reads one trimmed line. `None` once the input is closed.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks until the answer is an integer in `min..=max`.
    pub fn choice(&mut self, prompt: &str, min: u32, max: u32) -> Result<Option<u32>> {
        loop {
            let Some(line) = self.read_line(prompt)? else {
                return Ok(None);
            };
            match line.parse::<u32>() {
                Ok(n) if (min..=max).contains(&n) => return Ok(Some(n)),
                _ => writeln!(self.out, "Invalid selection. Enter {}-{}.", min, max)?,
            }
        }
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }
}

enum Menu {
    Start,
    Settings,
    About,
    Quit,
}

enum AfterRun {
    Redo,
    Menu,
    Quit,
}

/// Runs the menu until the participant quits. Returns the exit code.
pub async fn execute(cli: &Cli, cancel: &CancellationToken) -> i32 {
    let stdin = std::io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
    match menu_loop(cli, &mut prompter, cancel).await {
        Ok(code) => code,
        Err(e) => match e.downcast_ref::<EngineError>() {
            Some(engine) => report_failure(engine),
            None => {
                eprintln!("Error: {:#}", e);
                exit_codes::CONFIG_ERROR
            }
        },
    }
}

async fn menu_loop<R: BufRead, W: Write>(
    cli: &Cli,
    prompter: &mut Prompter<R, W>,
    cancel: &CancellationToken,
) -> Result<i32> {
    let mut settings = cli.run_config()?;
    let mut script = cli
        .simulate
        .as_deref()
        .map(ScriptedInput::parse)
        .transpose()
        .context("invalid --simulate script")?;
    prompter.say("Reflex ready.")?;

    loop {
        prompter.say(&format!(
            "\n=== Reflex ===\nCurrent settings: delay {:.3}-{:.3} s, trials {}\n\
             1. Start test\n2. Settings\n3. About\n4. Quit",
            settings.min_delay_seconds, settings.max_delay_seconds, settings.trial_count
        ))?;
        let menu = match prompter.choice("Select option: ", 1, 4)? {
            Some(1) => Menu::Start,
            Some(2) => Menu::Settings,
            Some(3) => Menu::About,
            _ => Menu::Quit,
        };
        match menu {
            Menu::Start => loop {
                let config = match settings.validate() {
                    Ok(config) => config,
                    Err(e) => {
                        prompter.say(&format!("Cannot start: {}", e))?;
                        break;
                    }
                };
                prompter.say(
                    "\n=== Test Run ===\n\
                     Wait for the white screen, then press any key or click as fast as possible.\n\
                     Press Esc during a run to abort back to the menu.",
                )?;
                if prompter.read_line("Press Enter to begin...")?.is_none() {
                    return Ok(exit_codes::SUCCESS);
                }

                let controller = RunController::new(config);
                match run_session(&controller, script.as_mut(), cancel).await {
                    Ok(result) => {
                        prompter.say(&report::render(&result))?;
                        export_csv(prompter, &result)?;
                    }
                    Err(EngineError::Aborted {
                        reason: AbortReason::Escape,
                        ..
                    }) => prompter.say("\nRun aborted.")?,
                    Err(e) => return Err(e.into()),
                }

                prompter.say("\n=== Next Action ===\n1. Redo test\n2. Back to main menu\n3. Quit")?;
                let next = match prompter.choice("Select option: ", 1, 3)? {
                    Some(1) => AfterRun::Redo,
                    Some(2) => AfterRun::Menu,
                    _ => AfterRun::Quit,
                };
                match next {
                    AfterRun::Redo => continue,
                    AfterRun::Menu => break,
                    AfterRun::Quit => return Ok(exit_codes::SUCCESS),
                }
            },
            Menu::Settings => edit_settings(prompter, &mut settings)?,
            Menu::About => {
                prompter.say(
                    "\n=== About Reflex ===\n\
                     Purpose: measure human reaction time with low-latency timing.\n\
                     Timing: monotonic nanosecond clock for stimulus and input timestamps.\n\
                     Input: any key press or mouse button in the terminal.\n\
                     Stimulus: black screen -> white screen only.",
                )?;
                if prompter.read_line("Press Enter to return to menu...")?.is_none() {
                    return Ok(exit_codes::SUCCESS);
                }
            }
            Menu::Quit => return Ok(exit_codes::SUCCESS),
        }
    }
}

fn edit_settings<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    settings: &mut RunConfig,
) -> Result<()> {
    loop {
        prompter.say(&format!(
            "\n=== Settings ===\n1. Min random delay (seconds): {:.3}\n\
             2. Max random delay (seconds): {:.3}\n3. Trial count: {}\n4. Back",
            settings.min_delay_seconds, settings.max_delay_seconds, settings.trial_count
        ))?;
        let Some(choice) = prompter.choice("Select option: ", 1, 4)? else {
            return Ok(());
        };
        let mut updated = settings.clone();
        let prompt = match choice {
            1 => "New min delay (seconds): ",
            2 => "New max delay (seconds): ",
            3 => "New trial count: ",
            _ => return Ok(()),
        };
        let Some(line) = prompter.read_line(prompt)? else {
            return Ok(());
        };
        let parsed = match choice {
            1 => line.parse::<f64>().map(|v| updated.min_delay_seconds = v).is_ok(),
            2 => line.parse::<f64>().map(|v| updated.max_delay_seconds = v).is_ok(),
            _ => line.parse::<i64>().map(|v| updated.trial_count = v).is_ok(),
        };
        if !parsed {
            prompter.say("Invalid value. Enter a number.")?;
            continue;
        }
        match updated.validate() {
            Ok(_) => *settings = updated,
            Err(e) => prompter.say(&format!("Invalid value: {}", e))?,
        }
    }
}

fn export_csv<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    result: &reflex_core::RunResult,
) -> Result<()> {
    loop {
        prompter.say("\n=== CSV Export ===\n1. Export to default filename\n2. Export to custom path\n3. Skip")?;
        let path = match prompter.choice("Select option: ", 1, 3)? {
            Some(1) => default_csv_path(),
            Some(2) => match prompter.read_line("Enter CSV output path: ")? {
                Some(line) if !line.is_empty() => PathBuf::from(line),
                Some(_) => {
                    prompter.say("Path cannot be empty.")?;
                    continue;
                }
                None => return Ok(()),
            },
            _ => return Ok(()),
        };
        match output::write_csv_atomic(&path, result) {
            Ok(()) => {
                prompter.say(&format!("CSV exported: {}", path.display()))?;
                return Ok(());
            }
            Err(e) => prompter.say(&format!("Export failed: {}", e))?,
        }
    }
}

fn default_csv_path() -> PathBuf {
    PathBuf::from(
        chrono::Local::now()
            .format("Reflex_%Y%m%d_%H%M%S.csv")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn choice_reprompts_until_in_range() {
        let mut p = prompter("9\nx\n2\n");
        assert_eq!(p.choice("> ", 1, 3).unwrap(), Some(2));
        let written = String::from_utf8(p.out).unwrap();
        assert_eq!(written.matches("Invalid selection. Enter 1-3.").count(), 2);
    }

    #[test]
    fn closed_input_ends_prompts() {
        let mut p = prompter("");
        assert_eq!(p.read_line("> ").unwrap(), None);
        assert_eq!(p.choice("> ", 1, 3).unwrap(), None);
    }

    #[test]
    fn settings_reject_values_that_break_the_config() {
        let mut settings = RunConfig::default();
        // max below min is refused, trial count accepted, then back
        let mut p = prompter("2\n1.0\n3\n4\n4\n");
        edit_settings(&mut p, &mut settings).unwrap();
        assert_eq!(settings.max_delay_seconds, 5.0);
        assert_eq!(settings.trial_count, 4);
        let written = String::from_utf8(p.out).unwrap();
        assert!(written.contains("Invalid value:"));
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_session_runs_and_quits() {
        let cli = Cli::try_parse_from([
            "reflex",
            "--min-delay",
            "0.5",
            "--max-delay",
            "1.5",
            "--trials",
            "2",
            "--simulate",
            "200,fs",
        ])
        .unwrap();
        // start, begin, skip export, quit
        let mut p = prompter("1\n\n3\n3\n");
        let code = menu_loop(&cli, &mut p, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(code, exit_codes::SUCCESS);
        let written = String::from_utf8(p.out).unwrap();
        assert!(written.contains("=== Results ==="));
        assert!(written.contains("Trial 2: delay="));
        assert!(written.contains("FALSE START"));
    }
}
