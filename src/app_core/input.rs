//! Input event types the reducer understands.
//!
//! The runtime converts crossterm events into these before calling the
//! reducer, so the reducer can be driven directly from tests.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKeyCode {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    Enter,
    Esc,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Debug, Clone, Copy)]
pub struct AppKeyEvent {
    pub code: AppKeyCode,
    pub ctrl: bool,
    pub shift: bool,
}

impl AppKeyEvent {
    pub fn new(code: AppKeyCode) -> Self {
        Self {
            code,
            ctrl: false,
            shift: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMouseKind {
    Move,
    LeftDown,
    ScrollUp,
    ScrollDown,
}

/// A mouse event in terminal cell coordinates.
#[derive(Debug, Clone, Copy)]
pub struct AppMouseEvent {
    pub kind: AppMouseKind,
    pub column: u16,
    pub row: u16,
}
