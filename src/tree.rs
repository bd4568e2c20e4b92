//! The folder tree: ownership, identity and navigation.
//!
//! Every folder and task lives in the `Tree` arena and is addressed by a
//! runtime-only id. A folder owns its children through ordered id lists;
//! the back-references (`TaskFolder::parent`, `Task::folder`) are plain ids
//! used for "go up" navigation and path rendering. They are not part of the
//! persisted document and are rebuilt by [`Tree::reconstruct`] after every
//! load.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::db::{format_due_input, FolderRecord};
use crate::status::Status;
use crate::task::{Task, PENDING_DELETION_SUFFIX};

/// Handle to a folder in a [`Tree`]. Never reused within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FolderId(u64);

/// Handle to a task in a [`Tree`]. Never reused within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// A selectable list entry: either kind of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemId {
    Folder(FolderId),
    Task(TaskId),
}

/// Shared capability of everything the list view shows.
pub trait Listable {
    /// Title as displayed, including any pending-deletion marker.
    fn title(&self) -> String;
    fn description(&self) -> &str;
    /// Text the list filter matches against.
    fn filter_value(&self) -> &str;
}

impl Listable for Task {
    fn title(&self) -> String {
        decorate(self.name.clone(), self.pending_deletion)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn filter_value(&self) -> &str {
        &self.name
    }
}

impl Listable for TaskFolder {
    fn title(&self) -> String {
        decorate(format!("📁 {}", self.name), self.pending_deletion)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn filter_value(&self) -> &str {
        &self.name
    }
}

fn decorate(mut title: String, pending: bool) -> String {
    if pending {
        title.push_str(PENDING_DELETION_SUFFIX);
    }
    title
}

/// Borrowed view of a node, used where either kind may appear.
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    Folder(&'a TaskFolder),
    Task(&'a Task),
}

impl Listable for ItemRef<'_> {
    fn title(&self) -> String {
        match self {
            ItemRef::Folder(f) => f.title(),
            ItemRef::Task(t) => t.title(),
        }
    }

    fn description(&self) -> &str {
        match self {
            ItemRef::Folder(f) => f.description(),
            ItemRef::Task(t) => t.description(),
        }
    }

    fn filter_value(&self) -> &str {
        match self {
            ItemRef::Folder(f) => f.filter_value(),
            ItemRef::Task(t) => t.filter_value(),
        }
    }
}

/// A named container of tasks and subfolders.
#[derive(Debug, Clone)]
pub struct TaskFolder {
    pub name: String,
    pub description: String,
    pub(crate) status: Status,
    pub(crate) parent: Option<FolderId>,
    pub(crate) tasks: Vec<TaskId>,
    pub(crate) folders: Vec<FolderId>,
    pub(crate) pending_deletion: bool,
}

impl TaskFolder {
    pub fn new(name: &str, description: &str) -> Self {
        TaskFolder {
            name: name.to_string(),
            description: description.to_string(),
            status: Status::default(),
            parent: None,
            tasks: Vec::new(),
            folders: Vec::new(),
            pending_deletion: false,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Containing folder; `None` for the root.
    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    pub fn is_pending_deletion(&self) -> bool {
        self.pending_deletion
    }
}

/// Arena owning a whole folder hierarchy.
#[derive(Debug, Clone)]
pub struct Tree {
    root: FolderId,
    folders: BTreeMap<FolderId, TaskFolder>,
    tasks: BTreeMap<TaskId, Task>,
    next_id: u64,
}

impl Tree {
    /// A tree holding only an empty root folder.
    pub fn new(root_name: &str, root_description: &str) -> Self {
        let mut tree = Tree {
            root: FolderId(0),
            folders: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_id: 0,
        };
        let root = FolderId(tree.alloc());
        tree.folders.insert(root, TaskFolder::new(root_name, root_description));
        tree.root = root;
        tree
    }

    /// Attach a freshly decoded document, rebuilding every back-reference.
    ///
    /// Walks the document top-down, assigning each subfolder's parent and
    /// each task's folder, then recomputes statuses and overdue flags as of
    /// `now`. Stored counters that disagree with the tasks are corrected.
    pub fn reconstruct(record: FolderRecord, now: DateTime<Local>) -> Self {
        let mut tree = Tree {
            root: FolderId(0),
            folders: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_id: 0,
        };
        tree.root = tree.attach(record, None, now);
        debug!(
            folders = tree.folders.len(),
            tasks = tree.tasks.len(),
            "reconstructed task tree"
        );
        tree
    }

    fn attach(&mut self, record: FolderRecord, parent: Option<FolderId>, now: DateTime<Local>) -> FolderId {
        let id = FolderId(self.alloc());
        let FolderRecord {
            name,
            description,
            status: stored,
            children_tasks,
            children_task_folders,
        } = record;

        let mut folder = TaskFolder::new(&name, &description);
        folder.parent = parent;
        for mut task in children_tasks {
            task.folder = Some(id);
            task.pending_deletion = false;
            task.refresh_overdue(now);
            let task_id = TaskId(self.alloc());
            folder.tasks.push(task_id);
            self.tasks.insert(task_id, task);
        }
        folder.status = Status::compute(folder.tasks.iter().filter_map(|t| self.tasks.get(t)), now);
        if (stored.completed, stored.total) != (folder.status.completed, folder.status.total) {
            warn!(
                folder = %folder.name,
                stored = ?stored,
                actual = ?folder.status,
                "stored folder status did not match its tasks; corrected"
            );
        }
        self.folders.insert(id, folder);

        for child in children_task_folders {
            let child_id = self.attach(child, Some(id), now);
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.folders.push(child_id);
            }
        }
        id
    }

    /// Detach the hierarchy into its persisted form, children in display order.
    pub fn to_record(&self) -> FolderRecord {
        self.record_of(self.root).unwrap_or_default()
    }

    fn record_of(&self, id: FolderId) -> Option<FolderRecord> {
        let folder = self.folders.get(&id)?;
        Some(FolderRecord {
            name: folder.name.clone(),
            description: folder.description.clone(),
            status: folder.status,
            children_tasks: folder
                .tasks
                .iter()
                .filter_map(|t| self.tasks.get(t).cloned())
                .collect(),
            children_task_folders: folder
                .folders
                .iter()
                .filter_map(|f| self.record_of(*f))
                .collect(),
        })
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn root(&self) -> FolderId {
        self.root
    }

    pub fn folder(&self, id: FolderId) -> Option<&TaskFolder> {
        self.folders.get(&id)
    }

    pub fn folder_mut(&mut self, id: FolderId) -> Option<&mut TaskFolder> {
        self.folders.get_mut(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<ItemRef<'_>> {
        match id {
            ItemId::Folder(f) => self.folder(f).map(ItemRef::Folder),
            ItemId::Task(t) => self.task(t).map(ItemRef::Task),
        }
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.item(id).is_some()
    }

    /// The folder containing `id`, if any.
    pub fn parent_of(&self, id: ItemId) -> Option<FolderId> {
        match id {
            ItemId::Folder(f) => self.folder(f)?.parent,
            ItemId::Task(t) => self.task(t)?.folder,
        }
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Direct tasks of a folder in display order.
    pub fn tasks_in(&self, folder: FolderId) -> impl Iterator<Item = (TaskId, &Task)> + '_ {
        self.folders.get(&folder).into_iter().flat_map(move |f| {
            f.tasks
                .iter()
                .filter_map(move |id| self.tasks.get(id).map(|t| (*id, t)))
        })
    }

    /// Direct subfolders of a folder in display order.
    pub fn folders_in(&self, folder: FolderId) -> impl Iterator<Item = (FolderId, &TaskFolder)> + '_ {
        self.folders.get(&folder).into_iter().flat_map(move |f| {
            f.folders
                .iter()
                .filter_map(move |id| self.folders.get(id).map(|c| (*id, c)))
        })
    }

    /// Everything the list view shows for a folder: subfolders, then tasks.
    pub fn entries(&self, folder: FolderId) -> Vec<ItemId> {
        self.folders_in(folder)
            .map(|(id, _)| ItemId::Folder(id))
            .chain(self.tasks_in(folder).map(|(id, _)| ItemId::Task(id)))
            .collect()
    }

    /// Full recompute of a folder's status, refreshing overdue flags first.
    pub fn recompute_status(&mut self, folder: FolderId, now: DateTime<Local>) {
        let Some(ids) = self.folders.get(&folder).map(|f| f.tasks.clone()) else {
            return;
        };
        for id in &ids {
            if let Some(task) = self.tasks.get_mut(id) {
                task.refresh_overdue(now);
            }
        }
        let status = Status::compute(ids.iter().filter_map(|id| self.tasks.get(id)), now);
        if let Some(f) = self.folders.get_mut(&folder) {
            f.status = status;
        }
    }

    /// Recompute every folder as of `now`.
    pub fn refresh_all(&mut self, now: DateTime<Local>) {
        let ids: Vec<FolderId> = self.folders.keys().copied().collect();
        for id in ids {
            self.recompute_status(id, now);
        }
    }

    /// Breadcrumb from the root down to `folder`, e.g. `Root > Work > Reports`.
    pub fn path(&self, folder: FolderId) -> String {
        let mut parts = Vec::new();
        let mut current = self.folder(folder);
        while let Some(f) = current {
            parts.push(if f.name.is_empty() { "Root" } else { f.name.as_str() });
            current = f.parent.and_then(|p| self.folder(p));
        }
        parts.reverse();
        parts.join(" > ")
    }

    /// Two-level outline of a folder: each subfolder with its tasks, then the
    /// folder's own tasks.
    pub fn preview(&self, folder: FolderId) -> String {
        let mut out = String::from("Task View\n");
        for (child_id, child) in self.folders_in(folder) {
            out.push_str(&child.title());
            out.push('\n');
            for (_, task) in self.tasks_in(child_id) {
                out.push_str("  - ");
                out.push_str(&task_line(task));
                out.push('\n');
            }
        }
        for (_, task) in self.tasks_in(folder) {
            out.push_str("- ");
            out.push_str(&task_line(task));
            out.push('\n');
        }
        out
    }

    pub(crate) fn insert_task(&mut self, folder: FolderId, mut task: Task) -> Option<TaskId> {
        if !self.folders.contains_key(&folder) {
            return None;
        }
        let id = TaskId(self.alloc());
        task.folder = Some(folder);
        self.tasks.insert(id, task);
        self.folders.get_mut(&folder)?.tasks.push(id);
        Some(id)
    }

    pub(crate) fn insert_folder(&mut self, parent: FolderId, mut folder: TaskFolder) -> Option<FolderId> {
        if !self.folders.contains_key(&parent) {
            return None;
        }
        let id = FolderId(self.alloc());
        folder.parent = Some(parent);
        self.folders.insert(id, folder);
        self.folders.get_mut(&parent)?.folders.push(id);
        Some(id)
    }

    /// Unlink an item from its parent and drop it (and any subtree) from the
    /// arena. Returns the parent whose children changed. The root cannot be
    /// removed.
    pub(crate) fn remove_item(&mut self, id: ItemId) -> Option<FolderId> {
        let parent = self.parent_of(id)?;
        let siblings = self.folders.get_mut(&parent)?;
        match id {
            ItemId::Task(task) => {
                siblings.tasks.retain(|t| *t != task);
                self.tasks.remove(&task);
            }
            ItemId::Folder(folder) => {
                siblings.folders.retain(|f| *f != folder);
                self.drop_subtree(folder);
            }
        }
        Some(parent)
    }

    fn drop_subtree(&mut self, id: FolderId) {
        if let Some(folder) = self.folders.remove(&id) {
            for task in folder.tasks {
                self.tasks.remove(&task);
            }
            for child in folder.folders {
                self.drop_subtree(child);
            }
        }
    }

    pub(crate) fn set_pending_deletion(&mut self, id: ItemId, pending: bool) {
        match id {
            ItemId::Folder(f) => {
                if let Some(folder) = self.folders.get_mut(&f) {
                    folder.pending_deletion = pending;
                }
            }
            ItemId::Task(t) => {
                if let Some(task) = self.tasks.get_mut(&t) {
                    task.pending_deletion = pending;
                }
            }
        }
    }

    pub(crate) fn tasks_mut(&mut self, folder: FolderId) -> Option<(&mut Vec<TaskId>, &BTreeMap<TaskId, Task>)> {
        let folder = self.folders.get_mut(&folder)?;
        Some((&mut folder.tasks, &self.tasks))
    }
}

fn task_line(task: &Task) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let due = match task.due {
        Some(due) if task.overdue => format!(" (overdue since {})", format_due_input(due)),
        Some(due) if !task.completed => format!(" (due {})", format_due_input(due)),
        _ => String::new(),
    };
    format!("{} {}{}", mark, task.name, due)
}
