//! Tree mutations: create, edit, toggle, staged deletion and sorting.
//!
//! Every operation keeps the affected folder's [`Status`](crate::status::Status)
//! equal to the aggregate over its direct tasks. None of them touch the disk;
//! the session saves the tree after each committing operation.

use std::cmp::Reverse;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::db::parse_due_input;
use crate::error::ValidationError;
use crate::fields::{Priority, SortKey};
use crate::task::Task;
use crate::tree::{FolderId, ItemId, Listable, TaskFolder, TaskId, Tree};

/// Raw field values collected by the editing form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    /// `DD/MM/YY HH:MM` or empty. Ignored for folders.
    pub due_date: String,
    /// `LOW`, `MED`, `HIGH` or empty. Ignored for folders.
    pub priority: String,
}

impl ItemFields {
    pub fn new(name: &str, description: &str) -> Self {
        ItemFields {
            name: name.to_string(),
            description: description.to_string(),
            ..ItemFields::default()
        }
    }

    pub fn with_due_date(mut self, due_date: &str) -> Self {
        self.due_date = due_date.to_string();
        self
    }

    pub fn with_priority(mut self, priority: &str) -> Self {
        self.priority = priority.to_string();
        self
    }
}

/// Task fields after validation.
struct ValidTask {
    name: String,
    description: String,
    due: Option<DateTime<Local>>,
    priority: Priority,
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

fn validate_task(fields: &ItemFields) -> Result<ValidTask, ValidationError> {
    Ok(ValidTask {
        name: validate_name(&fields.name)?,
        description: fields.description.clone(),
        due: parse_due_input(&fields.due_date)?,
        priority: Priority::parse_token(&fields.priority)?,
    })
}

/// Append a new task to `folder`.
///
/// Returns `Ok(None)` only if `folder` is not part of the tree.
pub fn create_task(
    tree: &mut Tree,
    folder: FolderId,
    fields: &ItemFields,
    now: DateTime<Local>,
) -> Result<Option<TaskId>, ValidationError> {
    let valid = validate_task(fields)?;
    let mut task = Task::new(&valid.name, &valid.description);
    task.due = valid.due;
    task.priority = valid.priority;
    task.refresh_overdue(now);
    let overdue = task.overdue;

    let Some(id) = tree.insert_task(folder, task) else {
        return Ok(None);
    };
    if let Some(f) = tree.folder_mut(folder) {
        f.status.add_task(false, overdue);
    }
    debug!(task = %valid.name, overdue, "created task");
    Ok(Some(id))
}

/// Append a new, empty subfolder to `parent`.
pub fn create_folder(
    tree: &mut Tree,
    parent: FolderId,
    fields: &ItemFields,
) -> Result<Option<FolderId>, ValidationError> {
    let name = validate_name(&fields.name)?;
    let folder = TaskFolder::new(&name, &fields.description);
    let id = tree.insert_folder(parent, folder);
    debug!(folder = %name, "created folder");
    Ok(id)
}

/// Update an item in place. Ownership and position are unchanged.
///
/// For tasks an empty due-date field clears the due date and an empty
/// priority field clears the priority.
pub fn edit_item(
    tree: &mut Tree,
    item: ItemId,
    fields: &ItemFields,
    now: DateTime<Local>,
) -> Result<(), ValidationError> {
    match item {
        ItemId::Folder(id) => {
            let name = validate_name(&fields.name)?;
            if let Some(folder) = tree.folder_mut(id) {
                folder.name = name;
                folder.description = fields.description.clone();
            }
        }
        ItemId::Task(id) => {
            let valid = validate_task(fields)?;
            let Some(task) = tree.task_mut(id) else {
                return Ok(());
            };
            task.name = valid.name;
            task.description = valid.description;
            task.due = valid.due;
            task.priority = valid.priority;
            if let Some(folder) = task.folder() {
                tree.recompute_status(folder, now);
            }
        }
    }
    debug!(?item, "edited item");
    Ok(())
}

/// Flip a task's completion and adjust its folder's counters incrementally.
///
/// Returns the new completion state, or `None` if the task does not exist.
pub fn toggle_complete(tree: &mut Tree, id: TaskId, now: DateTime<Local>) -> Option<bool> {
    let task = tree.task_mut(id)?;
    let before = (task.completed, task.overdue);
    task.completed = !task.completed;
    task.refresh_overdue(now);
    let after = (task.completed, task.overdue);
    let folder = task.folder();

    if let Some(f) = folder.and_then(|f| tree.folder_mut(f)) {
        f.status.apply_transition(before, after);
    }
    debug!(?id, completed = after.0, "toggled task");
    Some(after.0)
}

/// Reorder a folder's tasks. Subfolders and statuses are untouched.
///
/// All keys sort stably.
pub fn sort_tasks(tree: &mut Tree, folder: FolderId, key: SortKey) {
    let Some((ids, tasks)) = tree.tasks_mut(folder) else {
        return;
    };
    match key {
        SortKey::Priority => ids.sort_by_key(|id| Reverse(tasks.get(id).map(|t| t.priority))),
        SortKey::Name => ids.sort_by(|a, b| {
            let a = tasks.get(a).map(|t| t.name.as_str());
            let b = tasks.get(b).map(|t| t.name.as_str());
            b.cmp(&a)
        }),
        SortKey::Completion => ids.sort_by_key(|id| tasks.get(id).map(|t| t.completed)),
    }
    debug!(?folder, key = key.label(), "sorted tasks");
}

/// Items marked for deletion, awaiting confirm or cancel.
///
/// Staged items stay in the tree and are only flagged so the list can show
/// them as pending. The stage is a set: staging an item twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionStage {
    items: Vec<ItemId>,
}

impl DeletionStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an item as pending deletion. Returns `false` if it was already
    /// staged, does not exist, or is the root.
    pub fn stage(&mut self, tree: &mut Tree, item: ItemId) -> bool {
        if self.items.contains(&item) || tree.parent_of(item).is_none() {
            return false;
        }
        tree.set_pending_deletion(item, true);
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names of the staged items, in staging order.
    pub fn names(&self, tree: &Tree) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|id| tree.item(*id))
            .map(|item| item.filter_value().to_string())
            .collect()
    }

    /// Remove every staged item from its parent and recompute each affected
    /// folder. Returns the number of items removed.
    ///
    /// Items already gone (e.g. inside a staged folder removed earlier in the
    /// same confirm) are skipped.
    pub fn confirm(self, tree: &mut Tree, now: DateTime<Local>) -> usize {
        let mut affected: Vec<FolderId> = Vec::new();
        let mut removed = 0;
        for item in self.items {
            if let Some(parent) = tree.remove_item(item) {
                removed += 1;
                if !affected.contains(&parent) {
                    affected.push(parent);
                }
            }
        }
        for folder in affected {
            tree.recompute_status(folder, now);
        }
        debug!(removed, "confirmed deletion");
        removed
    }

    /// Clear every pending flag without structural change.
    pub fn cancel(self, tree: &mut Tree) {
        for item in self.items {
            tree.set_pending_deletion(item, false);
        }
    }
}
