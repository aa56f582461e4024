//! Input events shared by all backends, and terminal key mapping.
//!
//! Pure logic, no I/O. Backends translate their native events into
//! [`ViewerEvent`]s; the navigation loop only ever sees these.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::backend::ViewportGeometry;
use crate::error::Result;

/// What a key press asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Prev,
    Next,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    Command(Command),
    /// The drawable area changed; the backend has already resized its surface.
    Resize(ViewportGeometry),
    /// The window was closed by the user.
    Close,
    /// Anything the viewer does not react to.
    Ignored,
}

/// Blocking source of viewer events.
pub trait InputSource {
    /// Wait for the next event.
    fn poll(&mut self) -> Result<ViewerEvent>;
}

/// Character bindings common to every backend.
pub fn command_for_char(c: char) -> Option<Command> {
    match c {
        'a' => Some(Command::Prev),
        's' | ' ' => Some(Command::Next),
        'q' => Some(Command::Quit),
        _ => None,
    }
}

/// Map a terminal key event to a command. Returns `None` for unbound keys.
pub fn map_key_event(key: KeyEvent) -> Option<Command> {
    let KeyEvent {
        code, modifiers, ..
    } = key;

    match (code, modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Command::Quit),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => command_for_char(c),
        (KeyCode::Left | KeyCode::Up | KeyCode::PageUp, _) => Some(Command::Prev),
        (KeyCode::Right | KeyCode::Down | KeyCode::PageDown, _) => Some(Command::Next),
        _ => None,
    }
}
