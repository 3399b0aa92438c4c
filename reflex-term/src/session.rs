use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    style::ResetColor,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};

/// Puts the terminal into full-screen raw mode for the length of a run.
///
/// Dropping the session restores the terminal, including on early returns
/// and panics that unwind.
#[derive(Debug)]
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        log::debug!("terminal session entered");
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let restored = execute!(
            stdout,
            ResetColor,
            Show,
            DisableMouseCapture,
            LeaveAlternateScreen
        )
        .and_then(|_| disable_raw_mode())
        .and_then(|_| stdout.flush());
        if let Err(e) = restored {
            log::warn!("failed to restore terminal: {}", e);
        }
    }
}
