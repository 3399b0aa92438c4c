use std::io::{self, Stdout, Write};

use async_trait::async_trait;
use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    style::{Color, SetBackgroundColor},
    terminal::{Clear, ClearType},
};
use reflex_core::Cue;
use reflex_engine::{DeviceError, Presenter};

/// Fills the whole terminal with the cue color.
///
/// `present` resolves once the frame has been flushed to the terminal, which
/// is the closest thing to a completion signal a terminal offers.
pub struct TerminalPresenter<W: Write + Send = Stdout> {
    out: W,
}

impl TerminalPresenter<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn fill(&mut self, cue: Cue) -> io::Result<()> {
        let [r, g, b, _] = cue.color();
        self.out
            .queue(SetBackgroundColor(Color::Rgb { r, g, b }))?
            .queue(Clear(ClearType::All))?
            .queue(MoveTo(0, 0))?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    async fn present(&mut self, cue: Cue) -> Result<(), DeviceError> {
        self.fill(cue)
            .and_then(|_| self.out.flush())
            .map_err(DeviceError::Present)
    }
}
