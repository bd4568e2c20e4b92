//! Task data structure and related functionality.
//!
//! A `Task` is a single unit of work owned by exactly one folder. Its
//! back-reference to that folder is a navigation handle only, and is never
//! written to disk.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::fields::Priority;
use crate::tree::FolderId;

/// Suffix shown after the title of an item staged for deletion.
pub const PENDING_DELETION_SUFFIX: &str = " (queued for deletion)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        rename = "due_date",
        with = "crate::db::due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due: Option<DateTime<Local>>,
    #[serde(default)]
    pub overdue: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Owning folder. `None` while the task sits in a detached document.
    #[serde(skip)]
    pub(crate) folder: Option<FolderId>,
    #[serde(skip)]
    pub(crate) pending_deletion: bool,
}

impl Task {
    pub fn new(name: &str, description: &str) -> Self {
        Task {
            name: name.to_string(),
            description: description.to_string(),
            completed: false,
            due: None,
            overdue: false,
            priority: Priority::None,
            folder: None,
            pending_deletion: false,
        }
    }

    /// The folder this task belongs to, once attached to a tree.
    pub fn folder(&self) -> Option<FolderId> {
        self.folder
    }

    pub fn is_pending_deletion(&self) -> bool {
        self.pending_deletion
    }

    /// Whether the task would be overdue at `now`.
    pub fn is_overdue_at(&self, now: DateTime<Local>) -> bool {
        !self.completed && self.due.is_some_and(|due| now > due)
    }

    /// Recompute the cached overdue flag.
    pub fn refresh_overdue(&mut self, now: DateTime<Local>) {
        self.overdue = self.is_overdue_at(now);
    }
}
