//! Task board rendering: one column per status.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use termboard_proto::task::{Task, TaskStatus};

use super::theme;
use crate::app::App;

/// Render the four status columns of the board view.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    for (index, status) in TaskStatus::ALL.into_iter().enumerate() {
        render_column(frame, columns[index], app, status, index == app.selected_column);
    }
}

/// Render one status column with its tasks.
fn render_column(frame: &mut Frame, area: Rect, app: &App, status: TaskStatus, focused: bool) {
    let tasks = app.board_state.column(status);

    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| task_item(task, focused && i == app.selected_task))
        .collect();

    let border_style = if focused {
        theme::highlight()
    } else {
        theme::dimmed()
    };
    let title = format!(" {} ({}) ", status.label(), tasks.len());
    let block = Block::default()
        .title(Span::styled(
            title,
            theme::bold().fg(theme::status_color(status)),
        ))
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(List::new(items).block(block), area);
}

/// Build the two-line list entry for a task.
fn task_item(task: &Task, selected: bool) -> ListItem<'static> {
    let title_style = if selected {
        theme::highlight()
    } else {
        theme::normal()
    };

    let mut meta = vec![Span::styled(
        format!("P{}", task.priority),
        theme::dimmed().fg(theme::priority_color(task.priority)),
    )];
    if let Some(due) = task.due_date {
        meta.push(Span::raw(" "));
        meta.push(Span::styled(
            format!("due {}", due.format("%Y-%m-%d")),
            theme::dimmed(),
        ));
    }

    let marker = if selected { "› " } else { "  " };
    ListItem::new(vec![
        Line::from(vec![
            Span::styled(marker.to_string(), title_style),
            Span::styled(task.title.clone(), title_style),
        ]),
        Line::from(
            std::iter::once(Span::raw("    "))
                .chain(meta)
                .collect::<Vec<_>>(),
        ),
    ])
}
