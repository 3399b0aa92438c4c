use async_trait::async_trait;
use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use futures_util::StreamExt;
use reflex_engine::{DeviceError, InputSignal, InputSource};

/// Keyboard and mouse input from the controlling terminal.
pub struct TerminalInput {
    events: EventStream,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            events: EventStream::new(),
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a terminal event to an input signal. Esc and Ctrl-C abort, any other
/// key press or mouse button press is a response.
pub fn classify(event: &Event) -> Option<InputSignal> {
    match event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) => match code {
            KeyCode::Esc => Some(InputSignal::Abort),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(InputSignal::Abort)
            }
            _ => Some(InputSignal::Press),
        },
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(_),
            ..
        }) => Some(InputSignal::Press),
        _ => None,
    }
}

#[async_trait]
impl InputSource for TerminalInput {
    async fn next_signal(&mut self) -> Result<InputSignal, DeviceError> {
        // `next` on the stream is cancel safe; unread events stay queued.
        while let Some(event) = self.events.next().await {
            let event = event.map_err(DeviceError::Input)?;
            if let Some(signal) = classify(&event) {
                return Ok(signal);
            }
        }
        Ok(InputSignal::Closed)
    }
}
