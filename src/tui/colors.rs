//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Header and status bar background
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Folders and the focused form field
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Overdue tasks, items queued for deletion, warnings
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Editing form background
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);
