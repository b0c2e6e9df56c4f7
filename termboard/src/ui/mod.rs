//! Terminal UI rendering.

pub mod board_panel;
pub mod lists;
pub mod login;
pub mod status_bar;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, Editor, Screen, TaskField};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    // Content above, one-line status bar below.
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let content_area = main_chunks[0];
    let status_area = main_chunks[1];

    match app.screen {
        Screen::Login => login::render(frame, content_area, app),
        Screen::Projects => lists::render_projects(frame, content_area, app),
        Screen::Boards => lists::render_boards(frame, content_area, app),
        Screen::Tasks => board_panel::render(frame, content_area, app),
    }

    if let Some(editor) = &app.editor {
        render_editor(frame, content_area, editor);
    }

    status_bar::render(frame, status_area, app);
}

/// Render the active inline editor as a centered popup.
fn render_editor(frame: &mut Frame, area: Rect, editor: &Editor) {
    let (title, lines) = match editor {
        Editor::NewProject { title } => (
            " New project ",
            vec![editor_line("Title", title, true)],
        ),
        Editor::NewBoard { name } => (" New board ", vec![editor_line("Name", name, true)]),
        Editor::NewTask(form) => (
            " New task ",
            vec![
                editor_line("Title", &form.title, form.field == TaskField::Title),
                editor_line(
                    "Description",
                    &form.description,
                    form.field == TaskField::Description,
                ),
                editor_line("Priority", &form.priority, form.field == TaskField::Priority),
                editor_line("Due", &form.due, form.field == TaskField::Due),
            ],
        ),
    };

    let mut content = lines;
    content.push(Line::from(Span::styled(
        "Enter: save | Tab: next field | Esc: cancel",
        theme::dimmed(),
    )));

    let height = u16::try_from(content.len()).unwrap_or(u16::MAX).saturating_add(2);
    let popup = centered_rect(area, 54, height);

    let block = Block::default()
        .title(Span::styled(title, theme::bold()))
        .borders(Borders::ALL)
        .border_style(theme::highlight());

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(content).block(block), popup);
}

/// Build one labeled editor line with a focus cursor.
fn editor_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        theme::highlight()
    } else {
        theme::dimmed()
    };
    let mut spans = vec![
        Span::styled(format!(" {label:>11}: "), label_style),
        Span::styled(value.to_string(), theme::normal()),
    ];
    if focused {
        spans.push(Span::styled("▏", theme::highlight()));
    }
    Line::from(spans)
}

/// Center a fixed-size rectangle inside `area`.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
