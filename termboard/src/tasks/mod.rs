//! Local task state for the board view.
//!
//! Holds the task snapshot fetched over REST and reconciles live status
//! notifications into it. The upstream service is authoritative: a
//! notification replaces the status of the matching task and touches
//! nothing else, applied in delivery order.

use termboard_proto::board::BoardId;
use termboard_proto::task::{Task, TaskId, TaskStatus};

/// Task collection for one board view.
#[derive(Debug, Default)]
pub struct BoardState {
    board: Option<BoardId>,
    /// Tasks in server delivery order.
    tasks: Vec<Task>,
}

impl BoardState {
    /// Creates an empty state with no board loaded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            board: None,
            tasks: Vec::new(),
        }
    }

    /// Board whose tasks are currently loaded, if any.
    #[must_use]
    pub const fn board(&self) -> Option<BoardId> {
        self.board
    }

    /// Installs the REST snapshot for a board, replacing prior state.
    pub fn set_tasks(&mut self, board: BoardId, tasks: Vec<Task>) {
        self.board = Some(board);
        self.tasks = tasks;
    }

    /// Clears the loaded board (view exited).
    pub fn clear(&mut self) {
        self.board = None;
        self.tasks.clear();
    }

    /// Appends a newly created task.
    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Replaces the status of the matching task, leaving every other
    /// field untouched. Returns whether a task matched; unknown
    /// identifiers are ignored.
    pub fn apply_status(&mut self, task_id: TaskId, status: TaskStatus) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => {
                tracing::debug!(%task_id, "status update for unknown task ignored");
                false
            }
        }
    }

    /// All tasks in delivery order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks in the given status column, preserving delivery order.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    /// Looks up a task by identifier.
    #[must_use]
    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Number of loaded tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
