//! Task data model: identifiers, status, priority, and the task resource.
//!
//! Tasks are owned by boards. The `status` field is the only one mutated
//! after creation, either by a local user action or by a remote
//! notification on the board channel (see [`crate::sync`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::BoardId;

/// Unique identifier for a task.
///
/// Identifiers are assigned by the server and opaque to the client;
/// on the wire they are plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw server-assigned identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow status of a task.
///
/// Serialized in SCREAMING_SNAKE_CASE (`TODO`, `IN_PROGRESS`, `REVIEW`,
/// `DONE`) to match the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Completed.
    Done,
}

impl TaskStatus {
    /// All statuses in board-column order.
    pub const ALL: [Self; 4] = [Self::Todo, Self::InProgress, Self::Review, Self::Done];

    /// Human-readable column label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Review => "Review",
            Self::Done => "Done",
        }
    }

    /// The next status in column order, wrapping from Done back to To Do.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Todo => Self::InProgress,
            Self::InProgress => Self::Review,
            Self::Review => Self::Done,
            Self::Done => Self::Todo,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowest allowed task priority.
pub const MIN_PRIORITY: u8 = 1;

/// Highest allowed task priority.
pub const MAX_PRIORITY: u8 = 4;

/// Task priority in the range 1–4 (1 = lowest urgency).
///
/// Validated on construction and during deserialization; out-of-range
/// values are rejected rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    /// Creates a priority, rejecting values outside 1–4.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError`] if `value` is not in `1..=4`.
    pub const fn new(value: u8) -> Result<Self, PriorityError> {
        if value >= MIN_PRIORITY && value <= MAX_PRIORITY {
            Ok(Self(value))
        } else {
            Err(PriorityError(value))
        }
    }

    /// Returns the raw priority value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(MIN_PRIORITY)
    }
}

impl TryFrom<u8> for Priority {
    type Error = PriorityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority value outside the allowed 1–4 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {0}")]
pub struct PriorityError(pub u8);

/// A unit of work belonging to a board.
///
/// All fields except `status` are set at creation and never mutated by
/// the client; `status` changes via the board channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current workflow status.
    pub status: TaskStatus,
    /// Priority in the range 1–4.
    pub priority: Priority,
    /// Optional due timestamp.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Owning board.
    pub board: BoardId,
}

/// Request body for creating a task on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Initial workflow status.
    pub status: TaskStatus,
    /// Priority in the range 1–4.
    pub priority: Priority,
    /// Optional due timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Board the task belongs to.
    pub board: BoardId,
}
