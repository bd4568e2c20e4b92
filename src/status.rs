//! Aggregate completion counters for a folder.
//!
//! A folder's `Status` only ever counts its *direct* child tasks; tasks in
//! subfolders are never rolled up into an ancestor.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub completed: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub overdue: usize,
}

impl Status {
    /// Aggregate over a folder's direct tasks as of `now`.
    pub fn compute<'a, I>(tasks: I, now: DateTime<Local>) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut status = Status::default();
        for task in tasks {
            status.total += 1;
            if task.completed {
                status.completed += 1;
            } else if task.is_overdue_at(now) {
                status.overdue += 1;
            }
        }
        status
    }

    /// Fraction of tasks completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn summary(&self) -> String {
        format!("{} overdue, {}/{} completed", self.overdue, self.completed, self.total)
    }

    /// Account for a task that was just added.
    pub(crate) fn add_task(&mut self, completed: bool, overdue: bool) {
        self.total += 1;
        if completed {
            self.completed += 1;
        }
        if overdue {
            self.overdue += 1;
        }
    }

    /// Account for a task whose completion/overdue flags moved from `before` to `after`.
    pub(crate) fn apply_transition(&mut self, before: (bool, bool), after: (bool, bool)) {
        adjust(&mut self.completed, before.0, after.0);
        adjust(&mut self.overdue, before.1, after.1);
    }
}

fn adjust(counter: &mut usize, before: bool, after: bool) {
    match (before, after) {
        (false, true) => *counter += 1,
        (true, false) => *counter = counter.saturating_sub(1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(completed: bool, due_offset_hours: Option<i64>, now: DateTime<Local>) -> Task {
        let mut t = Task::new("t", "");
        t.completed = completed;
        t.due = due_offset_hours.map(|h| now + Duration::hours(h));
        t
    }

    #[test]
    fn test_compute_counts_direct_tasks() {
        let now = Local::now();
        let tasks = vec![
            task(true, None, now),
            task(false, Some(-2), now),
            task(true, Some(-2), now),
            task(false, Some(5), now),
            task(false, None, now),
        ];
        let status = Status::compute(&tasks, now);
        assert_eq!(status, Status { completed: 2, total: 5, overdue: 1 });
    }

    #[test]
    fn test_progress_and_summary() {
        let empty = Status::default();
        assert_eq!(empty.progress(), 0.0);

        let s = Status { completed: 1, total: 4, overdue: 2 };
        assert_eq!(s.progress(), 0.25);
        assert_eq!(s.summary(), "2 overdue, 1/4 completed");
    }

    #[test]
    fn test_transitions_never_underflow() {
        let mut s = Status::default();
        s.apply_transition((true, true), (false, false));
        assert_eq!(s, Status::default());
    }
}
