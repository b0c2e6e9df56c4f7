//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, Screen};
use crate::sync::ConnState;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.screen {
        Screen::Login => "Enter: submit | Tab: next field | Esc: quit",
        Screen::Projects => "Enter: open | n: new | r: refresh | Ctrl-L: logout | q: quit",
        Screen::Boards => "Enter: open | n: new | Esc: back",
        Screen::Tasks => "←→: column | ↑↓: task | s/Enter: advance status | n: new | Esc: back",
    };

    let mut spans = vec![
        Span::styled(
            concat!("TermBoard v", env!("CARGO_PKG_VERSION")),
            theme::bold(),
        ),
        Span::raw(" | "),
    ];

    // Connection indicator only matters while a board view is live.
    if app.screen == Screen::Tasks {
        let (dot_color, status_text) = match app.connection {
            ConnState::Open => (theme::SUCCESS, "Live"),
            ConnState::Connecting => (theme::WARNING, "Connecting…"),
            ConnState::Closing => (theme::WARNING, "Closing…"),
            ConnState::Disconnected => (theme::OFFLINE, "Offline"),
        };
        spans.push(Span::styled("●", theme::normal().fg(dot_color)));
        spans.push(Span::raw(format!(" {status_text} | ")));
    }

    if let Some(notice) = &app.notice {
        spans.push(Span::styled(notice.clone(), theme::normal().fg(theme::WARNING)));
        spans.push(Span::raw(" | "));
    }

    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
