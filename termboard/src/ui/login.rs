//! Login / registration form rendering.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::{App, LoginField};

/// Render the centered login form.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let form_height = if app.login.registering { 11 } else { 9 };
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(form_height),
            Constraint::Min(1),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(48),
            Constraint::Min(1),
        ])
        .split(vertical[1]);
    let form_area = horizontal[1];

    let title = if app.login.registering {
        " TermBoard — create account "
    } else {
        " TermBoard — sign in "
    };
    let block = Block::default()
        .title(Span::styled(title, theme::bold()))
        .borders(Borders::ALL)
        .border_style(theme::highlight());

    let masked: String = "•".repeat(app.login.password.chars().count());
    let mut lines = vec![
        Line::raw(""),
        field_line("Username", &app.login.username, app.login.field == LoginField::Username),
        Line::raw(""),
        field_line("Password", &masked, app.login.field == LoginField::Password),
    ];
    if app.login.registering {
        lines.push(Line::raw(""));
        lines.push(field_line(
            "Email",
            &app.login.email,
            app.login.field == LoginField::Email,
        ));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Enter: submit | Tab: next field | Ctrl-R: toggle register",
        theme::dimmed(),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}

/// Build one labeled input line with a focus cursor.
fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        theme::highlight()
    } else {
        theme::dimmed()
    };
    let mut spans = vec![
        Span::styled(format!(" {label:>8}: "), label_style),
        Span::styled(value.to_string(), theme::normal()),
    ];
    if focused {
        spans.push(Span::styled("▏", theme::highlight()));
    }
    Line::from(spans)
}
