//! Project and board list rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::theme;
use crate::app::App;

/// Render the project list screen.
pub fn render_projects(frame: &mut Frame, area: Rect, app: &App) {
    if app.projects.is_empty() {
        let block = Block::default()
            .title(" Projects ")
            .borders(Borders::ALL)
            .border_style(theme::dimmed());
        let hint = Paragraph::new("No projects yet — press 'n' to create one.")
            .style(theme::dimmed())
            .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = app
        .projects
        .iter()
        .enumerate()
        .map(|(i, project)| {
            let selected = i == app.selected_project;
            let style = if selected {
                theme::highlight()
            } else {
                theme::normal()
            };
            let marker = if selected { "› " } else { "  " };
            let mut spans = vec![
                Span::styled(marker, style),
                Span::styled(project.title.clone(), style),
            ];
            if let Some(description) = &project.description {
                spans.push(Span::styled(format!("  — {description}"), theme::dimmed()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let block = Block::default()
        .title(" Projects ")
        .borders(Borders::ALL)
        .border_style(theme::dimmed());
    frame.render_widget(List::new(items).block(block), area);
}

/// Render the board list screen for the selected project.
pub fn render_boards(frame: &mut Frame, area: Rect, app: &App) {
    let title = app
        .projects
        .iter()
        .find(|p| Some(p.id) == app.current_project)
        .map_or_else(|| " Boards ".to_string(), |p| format!(" Boards — {} ", p.title));

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme::dimmed());

    if app.boards.is_empty() {
        let hint = Paragraph::new("No boards in this project — press 'n' to create one.")
            .style(theme::dimmed())
            .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = app
        .boards
        .iter()
        .enumerate()
        .map(|(i, board)| {
            let selected = i == app.selected_board;
            let style = if selected {
                theme::highlight()
            } else {
                theme::normal()
            };
            let marker = if selected { "› " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(board.name.clone(), style),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
