//! Enumerations for TUI state management.

use crate::ops::DeletionStage;
use crate::tui::item_form::ItemForm;

/// Modal state of the session. Payloads only exist while their mode does.
#[derive(Debug, Clone)]
pub enum Mode {
    Browsing,
    EditingFields(ItemForm),
    DeleteStaging(DeletionStage),
    SortSelecting,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Browsing => "Browsing",
            Mode::EditingFields(form) if form.is_editing() => "Editing",
            Mode::EditingFields(_) => "Creating",
            Mode::DeleteStaging(_) => "Deleting",
            Mode::SortSelecting => "Sorting",
        }
    }
}

/// A discrete input event, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Char(char),
    Enter,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    Backspace,
    Delete,
    /// Switch a new item between task and folder.
    ToggleTarget,
    /// Ctrl+C; quits from any mode.
    Interrupt,
}

/// What the event loop should do after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Transient message shown over the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Warning(s) | Notice::Error(s) => s,
        }
    }
}
