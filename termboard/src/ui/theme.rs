//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};

use termboard_proto::task::{Priority, TaskStatus};

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success/connected indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning/reconnecting indicator color.
pub const WARNING: Color = Color::Yellow;

/// Error indicator color.
pub const ERROR: Color = Color::Red;

/// Disconnected indicator color.
pub const OFFLINE: Color = Color::DarkGray;

/// Default text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style for secondary information.
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default()
        .fg(FG_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

/// Style for the focused/selected element.
#[must_use]
pub fn highlight() -> Style {
    Style::default()
        .fg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Background style for the status bar.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().bg(Color::Rgb(30, 30, 40))
}

/// Accent color for a status column.
#[must_use]
pub const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Gray,
        TaskStatus::InProgress => Color::Blue,
        TaskStatus::Review => Color::Yellow,
        TaskStatus::Done => Color::Green,
    }
}

/// Accent color for a task priority (1 = calm, 4 = urgent).
#[must_use]
pub const fn priority_color(priority: Priority) -> Color {
    match priority.value() {
        1 => Color::Cyan,
        2 => Color::Green,
        3 => Color::Yellow,
        _ => Color::Red,
    }
}
