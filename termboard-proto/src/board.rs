//! Board data model.
//!
//! Boards group tasks within a project. The sync client only needs a
//! board's identifier to open its live channel; the rest of the resource
//! is consumed by the board browser UI.

use serde::{Deserialize, Serialize};

use crate::project::ProjectId;
use crate::task::Task;

/// Unique identifier for a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(i64);

impl BoardId {
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

impl std::fmt::Display for BoardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named grouping of tasks belonging to a project.
///
/// The board-detail endpoint includes the full task collection; the
/// board-list endpoint omits it (hence the default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Server-assigned identifier.
    pub id: BoardId,
    /// Display name.
    pub name: String,
    /// Owning project.
    pub project: ProjectId,
    /// Tasks on this board, in server delivery order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Request body for creating a board within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBoard {
    /// Display name.
    pub name: String,
    /// Owning project.
    pub project: ProjectId,
}
