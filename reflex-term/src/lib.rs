//! Terminal devices: full-screen color cues and keyboard/mouse input.

pub mod input;
pub mod presenter;
pub mod session;

pub use input::{TerminalInput, classify};
pub use presenter::TerminalPresenter;
pub use session::TerminalSession;
