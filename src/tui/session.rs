//! The interactive session: the modal state machine behind the TUI.
//!
//! A `Session` owns the tree and its store, and reacts to backend-neutral
//! [`Input`] events. Every committing change (create, edit, toggle,
//! confirmed deletion, sort) saves the whole tree. A failed save is
//! reported but the in-memory change is kept.

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::db::Store;
use crate::fields::SortKey;
use crate::ops::{create_folder, create_task, edit_item, sort_tasks, toggle_complete, DeletionStage};
use crate::tree::{FolderId, ItemId, Listable, Tree};
use crate::tui::enums::{Flow, Input, Mode, Notice};
use crate::tui::item_form::{ItemForm, ItemKind};

const SORT_PROMPT: &str = "Sort tasks by:\n  1: priority\n  2: name\n  3: completion status\n\nesc: cancel";

/// List filter. While `editing`, keystrokes go to the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub query: String,
    pub editing: bool,
}

pub struct Session {
    tree: Tree,
    store: Store,
    current: FolderId,
    selected: usize,
    /// Selection index in each ancestor, innermost last.
    breadcrumbs: Vec<usize>,
    mode: Mode,
    filter: Option<Filter>,
    status_message: String,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(tree: Tree, store: Store) -> Self {
        let current = tree.root();
        Session {
            tree,
            store,
            current,
            selected: 0,
            breadcrumbs: Vec::new(),
            mode: Mode::Browsing,
            filter: None,
            status_message: String::new(),
            notice: None,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn current_folder(&self) -> FolderId {
        self.current
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn breadcrumbs(&self) -> &[usize] {
        &self.breadcrumbs
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Path of the current folder followed by its status summary.
    pub fn title(&self) -> String {
        let summary = self
            .tree
            .folder(self.current)
            .map(|f| f.status().summary())
            .unwrap_or_default();
        format!("{}\n{}", self.tree.path(self.current), summary)
    }

    /// Entries of the current folder that pass the filter.
    pub fn visible_entries(&self) -> Vec<ItemId> {
        let entries = self.tree.entries(self.current);
        match &self.filter {
            Some(filter) if !filter.query.is_empty() => {
                let query = filter.query.to_lowercase();
                entries
                    .into_iter()
                    .filter(|id| {
                        self.tree
                            .item(*id)
                            .is_some_and(|item| item.filter_value().to_lowercase().contains(&query))
                    })
                    .collect()
            }
            _ => entries,
        }
    }

    pub fn selected_item(&self) -> Option<ItemId> {
        self.visible_entries().get(self.selected).copied()
    }

    /// Bring overdue flags and counters of the displayed folders up to `now`.
    pub fn refresh(&mut self, now: DateTime<Local>) {
        let children: Vec<FolderId> = self.tree.folders_in(self.current).map(|(id, _)| id).collect();
        self.tree.recompute_status(self.current, now);
        for child in children {
            self.tree.recompute_status(child, now);
        }
    }

    /// React to one input event.
    pub fn handle(&mut self, input: Input, now: DateTime<Local>) -> Flow {
        if input == Input::Interrupt {
            return Flow::Quit;
        }
        self.notice = None;
        if self.filter.as_ref().is_some_and(|f| f.editing) {
            self.handle_filter_input(input);
            return Flow::Continue;
        }

        let (mode, flow) = match std::mem::replace(&mut self.mode, Mode::Browsing) {
            Mode::Browsing => self.handle_browsing_input(input, now),
            Mode::EditingFields(form) => (self.handle_editing_input(form, input, now), Flow::Continue),
            Mode::DeleteStaging(stage) => (self.handle_staging_input(stage, input, now), Flow::Continue),
            Mode::SortSelecting => (self.handle_sort_input(input, now), Flow::Continue),
        };
        self.mode = mode;
        flow
    }

    fn handle_filter_input(&mut self, input: Input) {
        let Some(filter) = self.filter.as_mut() else {
            return;
        };
        match input {
            Input::Char(c) => filter.query.push(c),
            Input::Backspace => {
                filter.query.pop();
            }
            Input::Enter => {
                filter.editing = false;
                if filter.query.is_empty() {
                    self.filter = None;
                }
            }
            Input::Esc => {
                self.filter = None;
                self.set_status_message("Filter cleared");
            }
            _ => return,
        }
        self.selected = 0;
    }

    fn handle_browsing_input(&mut self, input: Input, now: DateTime<Local>) -> (Mode, Flow) {
        match input {
            Input::Char('q') => return (Mode::Browsing, Flow::Quit),
            Input::Up => self.select_prev(),
            Input::Down => self.select_next(),
            Input::Char('/') => {
                self.filter = Some(Filter {
                    query: String::new(),
                    editing: true,
                });
                self.selected = 0;
            }
            Input::Esc => {
                if self.filter.take().is_some() {
                    self.selected = 0;
                    self.set_status_message("Filter cleared");
                }
            }
            Input::Enter => match self.selected_item() {
                Some(ItemId::Folder(id)) => self.descend(id),
                Some(ItemId::Task(id)) => {
                    if toggle_complete(&mut self.tree, id, now).is_some() {
                        self.persist(now);
                    }
                }
                None => {}
            },
            Input::Char('b') => self.ascend(),
            Input::Char('p') => self.preview(),
            Input::Char('r') => self.reload(now),
            Input::Char('n') => {
                return (Mode::EditingFields(ItemForm::create(ItemKind::Task)), Flow::Continue);
            }
            Input::Char('e') => {
                if let Some(form) = self.selected_item().and_then(|item| ItemForm::edit(&self.tree, item)) {
                    return (Mode::EditingFields(form), Flow::Continue);
                }
            }
            Input::Char('d') => {
                if let Some(item) = self.selected_item() {
                    let mut stage = DeletionStage::new();
                    if stage.stage(&mut self.tree, item) {
                        self.show_staged(&stage);
                        return (Mode::DeleteStaging(stage), Flow::Continue);
                    }
                }
            }
            Input::Char('f') => {
                self.set_status_message(SORT_PROMPT);
                return (Mode::SortSelecting, Flow::Continue);
            }
            _ => {}
        }
        (Mode::Browsing, Flow::Continue)
    }

    fn handle_editing_input(&mut self, mut form: ItemForm, input: Input, now: DateTime<Local>) -> Mode {
        match input {
            Input::Esc => {
                self.set_status_message("Cancelled");
                return Mode::Browsing;
            }
            Input::Enter => return self.commit(form, now),
            Input::Tab | Input::Down => form.next_field(),
            Input::BackTab | Input::Up => form.prev_field(),
            Input::ToggleTarget => {
                form.toggle_kind();
            }
            Input::Char(c) => form.handle_char(c),
            Input::Backspace => form.handle_backspace(),
            Input::Delete => form.handle_delete(),
            Input::Left => form.handle_left_right(false),
            Input::Right => form.handle_left_right(true),
            Input::Interrupt => {}
        }
        Mode::EditingFields(form)
    }

    fn commit(&mut self, mut form: ItemForm, now: DateTime<Local>) -> Mode {
        let fields = form.values();
        let result = match (form.target(), form.kind()) {
            (Some(item), _) => edit_item(&mut self.tree, item, &fields, now).map(|()| Some(item)),
            (None, ItemKind::Task) => {
                create_task(&mut self.tree, self.current, &fields, now).map(|id| id.map(ItemId::Task))
            }
            (None, ItemKind::Folder) => {
                create_folder(&mut self.tree, self.current, &fields).map(|id| id.map(ItemId::Folder))
            }
        };
        match result {
            Ok(item) => {
                let verb = if form.is_editing() { "Updated" } else { "Created" };
                self.set_status_message(&format!("{verb} {}", fields.name.trim()));
                self.persist(now);
                if let Some(item) = item {
                    self.select(item);
                }
                Mode::Browsing
            }
            Err(err) => {
                self.notice = Some(Notice::Error(err.to_string()));
                form.error = Some(err);
                Mode::EditingFields(form)
            }
        }
    }

    fn handle_staging_input(&mut self, mut stage: DeletionStage, input: Input, now: DateTime<Local>) -> Mode {
        match input {
            Input::Char('c') => {
                self.confirm_deletion(stage, now);
                return Mode::Browsing;
            }
            Input::Esc => {
                stage.cancel(&mut self.tree);
                self.set_status_message("Deletion cancelled");
                return Mode::Browsing;
            }
            Input::Char('d') => {
                if let Some(item) = self.selected_item() {
                    stage.stage(&mut self.tree, item);
                }
            }
            Input::Up => self.select_prev(),
            Input::Down => self.select_next(),
            Input::Char('b') => self.ascend(),
            Input::Enter => {
                if let Some(ItemId::Folder(id)) = self.selected_item() {
                    self.descend(id);
                }
            }
            _ => {}
        }
        self.show_staged(&stage);
        Mode::DeleteStaging(stage)
    }

    fn confirm_deletion(&mut self, stage: DeletionStage, now: DateTime<Local>) {
        let (landing, climb) = self.surviving_ancestor(&stage);
        let removed = stage.confirm(&mut self.tree, now);
        if climb > 0 {
            self.current = landing;
            for _ in 0..climb {
                self.selected = self.breadcrumbs.pop().unwrap_or(0);
            }
            self.filter = None;
        }
        self.clamp_selection();
        info!(removed, "deleted staged items");
        self.set_status_message(&format!("Deleted {removed} item(s)"));
        self.persist(now);
    }

    /// The nearest ancestor of the current folder that survives `stage`, and
    /// how many levels up it is.
    fn surviving_ancestor(&self, stage: &DeletionStage) -> (FolderId, usize) {
        let mut chain = Vec::new();
        let mut folder = Some(self.current);
        while let Some(id) = folder {
            chain.push(id);
            folder = self.tree.folder(id).and_then(|f| f.parent());
        }
        match chain.iter().rposition(|id| stage.contains(ItemId::Folder(*id))) {
            Some(topmost) => {
                let climb = topmost + 1;
                (chain.get(climb).copied().unwrap_or(self.tree.root()), climb)
            }
            None => (self.current, 0),
        }
    }

    fn handle_sort_input(&mut self, input: Input, now: DateTime<Local>) -> Mode {
        let key = match input {
            Input::Char('1') => SortKey::Priority,
            Input::Char('2') => SortKey::Name,
            Input::Char('3') => SortKey::Completion,
            Input::Esc => {
                self.set_status_message("Sort cancelled");
                return Mode::Browsing;
            }
            _ => return Mode::SortSelecting,
        };
        sort_tasks(&mut self.tree, self.current, key);
        self.selected = 0;
        self.set_status_message(&format!("Sorted by {}", key.label()));
        self.persist(now);
        Mode::Browsing
    }

    fn descend(&mut self, folder: FolderId) {
        // Recorded against the unfiltered list; the filter is cleared below.
        let index = self
            .selected_item()
            .and_then(|item| self.tree.entries(self.current).iter().position(|id| *id == item))
            .unwrap_or(self.selected);
        self.breadcrumbs.push(index);
        self.current = folder;
        self.selected = 0;
        self.filter = None;
        self.set_status_message(&format!("Navigated to {}", self.tree.path(folder)));
    }

    fn ascend(&mut self) {
        let Some(parent) = self.tree.folder(self.current).and_then(|f| f.parent()) else {
            self.set_status_message("Already at top level");
            return;
        };
        self.current = parent;
        self.selected = self.breadcrumbs.pop().unwrap_or(0);
        self.filter = None;
        self.clamp_selection();
        self.set_status_message(&format!("Navigated back to {}", self.tree.path(parent)));
    }

    fn preview(&mut self) {
        match self.selected_item() {
            Some(ItemId::Folder(id)) => {
                let outline = self.tree.preview(id);
                self.set_status_message(&outline);
            }
            Some(ItemId::Task(_)) => {
                self.notice = Some(Notice::Info("Cannot preview a task".to_string()));
            }
            None => self.set_status_message("No item selected"),
        }
    }

    fn reload(&mut self, now: DateTime<Local>) {
        match self.store.load_tree(now) {
            Ok(tree) => {
                self.tree = tree;
                self.current = self.tree.root();
                self.selected = 0;
                self.breadcrumbs.clear();
                self.filter = None;
                info!(path = %self.store.path().display(), "reloaded task tree");
                self.set_status_message("Reloaded from disk");
            }
            Err(err) => {
                warn!(error = %err, "reload failed; keeping current tree");
                self.notice = Some(Notice::Warning(format!("Reload failed: {err}")));
            }
        }
    }

    /// Save the whole tree. On failure the in-memory state is kept.
    fn persist(&mut self, now: DateTime<Local>) {
        self.tree.refresh_all(now);
        if let Err(err) = self.store.save(&self.tree) {
            warn!(error = %err, "failed to save task tree; in-memory changes kept");
            self.notice = Some(Notice::Warning(format!("Changes not saved: {err}")));
        }
    }

    fn show_staged(&mut self, stage: &DeletionStage) {
        let mut msg = String::from("Pending deletion:\n");
        for name in stage.names(&self.tree) {
            msg.push_str("  ");
            msg.push_str(&name);
            msg.push('\n');
        }
        msg.push_str("\nc: confirm  esc: cancel");
        self.set_status_message(&msg);
    }

    fn set_status_message(&mut self, msg: &str) {
        self.status_message = msg.to_string();
    }

    fn select(&mut self, item: ItemId) {
        if let Some(index) = self.visible_entries().iter().position(|id| *id == item) {
            self.selected = index;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.status_message.clear();
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.visible_entries().len() {
            self.selected += 1;
        }
        self.status_message.clear();
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_entries().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::ops::ItemFields;
    use crate::status::Status;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    fn session_with(tree: Tree) -> (TempDir, Session) {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("config.json"));
        store.save(&tree).unwrap();
        (dir, Session::new(tree, store))
    }

    fn press(session: &mut Session, inputs: &[Input]) {
        for input in inputs {
            session.handle(*input, Local::now());
        }
    }

    fn type_text(session: &mut Session, text: &str) {
        for c in text.chars() {
            session.handle(Input::Char(c), Local::now());
        }
    }

    fn folder(tree: &mut Tree, parent: FolderId, name: &str) -> FolderId {
        create_folder(tree, parent, &ItemFields::new(name, "")).unwrap().unwrap()
    }

    fn task(tree: &mut Tree, parent: FolderId, name: &str) -> crate::tree::TaskId {
        create_task(tree, parent, &ItemFields::new(name, ""), Local::now())
            .unwrap()
            .unwrap()
    }

    fn task_names(tree: &Tree, folder: FolderId) -> Vec<String> {
        tree.tasks_in(folder).map(|(_, t)| t.name.clone()).collect()
    }

    #[test]
    fn test_create_folder_and_task_then_toggle_persists() {
        let (_dir, mut s) = session_with(Tree::new("Root", ""));

        press(&mut s, &[Input::Char('n'), Input::ToggleTarget]);
        type_text(&mut s, "Groceries");
        press(&mut s, &[Input::Enter]);
        assert!(matches!(s.mode(), Mode::Browsing));

        press(&mut s, &[Input::Enter]);
        let groceries = s.current_folder();
        assert_eq!(s.tree().path(groceries), "Root > Groceries");

        press(&mut s, &[Input::Char('n')]);
        type_text(&mut s, "Milk");
        press(&mut s, &[Input::Down]);
        type_text(&mut s, "2%");
        press(&mut s, &[Input::Enter, Input::Enter]);

        let reloaded = s.store().load_tree(Local::now()).unwrap();
        let (id, record) = reloaded.folders_in(reloaded.root()).next().unwrap();
        assert_eq!(record.name, "Groceries");
        assert_eq!(record.status(), Status { completed: 1, total: 1, overdue: 0 });
        let milk: Vec<_> = reloaded.tasks_in(id).map(|(_, t)| (t.name.clone(), t.description.clone())).collect();
        assert_eq!(milk, vec![("Milk".to_string(), "2%".to_string())]);
    }

    #[test]
    fn test_validation_error_keeps_form_open() {
        let (_dir, mut s) = session_with(Tree::new("Root", ""));
        press(&mut s, &[Input::Char('n'), Input::Enter]);

        match s.mode() {
            Mode::EditingFields(form) => assert_eq!(form.error, Some(ValidationError::EmptyName)),
            other => panic!("unexpected mode {other:?}"),
        }
        assert!(matches!(s.notice(), Some(Notice::Error(_))));
        assert_eq!(s.tree().task_count(), 0);

        type_text(&mut s, "quit is just text");
        press(&mut s, &[Input::Down, Input::Down]);
        type_text(&mut s, "yesterday");
        assert_eq!(s.handle(Input::Enter, Local::now()), Flow::Continue);
        assert!(matches!(s.mode(), Mode::EditingFields(_)));
        assert_eq!(s.tree().task_count(), 0);

        press(&mut s, &[Input::Esc]);
        assert!(matches!(s.mode(), Mode::Browsing));
        assert_eq!(s.tree().task_count(), 0);
    }

    #[test]
    fn test_edit_prepopulates_and_saves() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        task(&mut tree, root, "Draft");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Char('e')]);
        match s.mode() {
            Mode::EditingFields(form) => assert_eq!(form.name.value, "Draft"),
            other => panic!("unexpected mode {other:?}"),
        }
        type_text(&mut s, " v2");
        press(&mut s, &[Input::Enter]);

        let reloaded = s.store().load_tree(Local::now()).unwrap();
        assert_eq!(task_names(&reloaded, reloaded.root()), vec!["Draft v2"]);
    }

    #[test]
    fn test_filter_query_preempts_commands() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        task(&mut tree, root, "Apples");
        task(&mut tree, root, "Bananas");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Char('/')]);
        type_text(&mut s, "nq");
        assert!(matches!(s.mode(), Mode::Browsing));
        assert_eq!(s.filter().unwrap().query, "nq");

        press(&mut s, &[Input::Backspace, Input::Enter]);
        assert_eq!(s.filter(), Some(&Filter { query: "n".to_string(), editing: false }));
        let visible = s.visible_entries();
        assert_eq!(visible.len(), 1);
        assert_eq!(s.tree().item(visible[0]).unwrap().filter_value(), "Bananas");

        press(&mut s, &[Input::Esc]);
        assert_eq!(s.filter(), None);
        assert_eq!(s.visible_entries().len(), 2);
    }

    #[test]
    fn test_stage_cancel_and_confirm() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        task(&mut tree, root, "a");
        task(&mut tree, root, "b");
        task(&mut tree, root, "c");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Char('d'), Input::Char('d')]);
        match s.mode() {
            Mode::DeleteStaging(stage) => assert_eq!(stage.len(), 1),
            other => panic!("unexpected mode {other:?}"),
        }
        assert!(s.status_message().starts_with("Pending deletion:\n  a\n"));
        assert_eq!(s.tree().entries(root).len(), 3);
        press(&mut s, &[Input::Esc]);
        assert!(matches!(s.mode(), Mode::Browsing));
        assert_eq!(s.tree().entries(root).len(), 3);
        assert!(s.tree().tasks_in(root).all(|(_, t)| !t.is_pending_deletion()));

        press(&mut s, &[Input::Char('d'), Input::Down, Input::Down, Input::Char('d'), Input::Char('c')]);
        assert!(matches!(s.mode(), Mode::Browsing));
        assert_eq!(task_names(s.tree(), root), vec!["b"]);
        assert_eq!(s.selected(), 0);

        let reloaded = s.store().load_tree(Local::now()).unwrap();
        assert_eq!(task_names(&reloaded, reloaded.root()), vec!["b"]);
    }

    #[test]
    fn test_staging_spans_folders() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        let left = folder(&mut tree, root, "Left");
        folder(&mut tree, left, "X");
        folder(&mut tree, left, "Keep");
        let right = folder(&mut tree, root, "Right");
        for name in ["r0", "y", "r2", "r3"] {
            task(&mut tree, right, name);
        }
        let (_dir, mut s) = session_with(tree);

        // Into Left, stage X, back out, into Right, stage y.
        press(&mut s, &[Input::Enter, Input::Char('d'), Input::Char('b')]);
        press(&mut s, &[Input::Down, Input::Enter, Input::Down, Input::Char('d')]);
        match s.mode() {
            Mode::DeleteStaging(stage) => assert_eq!(stage.names(s.tree()), vec!["X", "y"]),
            other => panic!("unexpected mode {other:?}"),
        }
        press(&mut s, &[Input::Char('c')]);

        let tree = s.tree();
        assert_eq!(task_names(tree, right), vec!["r0", "r2", "r3"]);
        let left_children: Vec<_> = tree.folders_in(left).map(|(_, f)| f.name.clone()).collect();
        assert_eq!(left_children, vec!["Keep"]);
        assert_eq!(tree.folder(right).unwrap().status().total, 3);
    }

    #[test]
    fn test_confirm_inside_staged_folder_returns_to_survivor() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        let keep = folder(&mut tree, root, "Keep");
        let doomed = folder(&mut tree, root, "Doomed");
        let inner = folder(&mut tree, doomed, "Inner");
        task(&mut tree, inner, "t");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Down, Input::Char('d'), Input::Enter, Input::Enter]);
        assert_eq!(s.breadcrumbs(), &[1, 0]);
        press(&mut s, &[Input::Char('c')]);

        assert_eq!(s.current_folder(), root);
        assert!(s.breadcrumbs().is_empty());
        assert_eq!(s.tree().entries(root), vec![ItemId::Folder(keep)]);
        assert_eq!(s.selected(), 0);
        assert_eq!(s.tree().task_count(), 0);
    }

    #[test]
    fn test_ascend_after_filtered_descent_reselects_folder() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        folder(&mut tree, root, "Alpha");
        folder(&mut tree, root, "Beta");
        let gamma = folder(&mut tree, root, "Gamma");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Char('/')]);
        type_text(&mut s, "gam");
        press(&mut s, &[Input::Enter, Input::Enter]);
        assert_eq!(s.current_folder(), gamma);
        assert_eq!(s.breadcrumbs(), &[2]);

        press(&mut s, &[Input::Char('b')]);
        assert_eq!(s.current_folder(), root);
        assert_eq!(s.selected_item(), Some(ItemId::Folder(gamma)));
    }

    #[test]
    fn test_moving_cursor_clears_status_message() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        let sub = folder(&mut tree, root, "Sub");
        task(&mut tree, sub, "one");
        task(&mut tree, sub, "two");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Enter]);
        assert_eq!(s.status_message(), "Navigated to Root > Sub");
        press(&mut s, &[Input::Down]);
        assert_eq!(s.status_message(), "");
    }

    #[test]
    fn test_breadcrumbs_restore_selection() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        folder(&mut tree, root, "A");
        let b = folder(&mut tree, root, "B");
        folder(&mut tree, b, "C");
        let d = folder(&mut tree, b, "D");
        task(&mut tree, d, "leaf");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Down, Input::Enter, Input::Down, Input::Enter]);
        assert_eq!(s.current_folder(), d);
        assert_eq!(s.breadcrumbs(), &[1, 1]);

        press(&mut s, &[Input::Char('b')]);
        assert_eq!(s.current_folder(), b);
        assert_eq!(s.selected(), 1);
        press(&mut s, &[Input::Char('b')]);
        assert_eq!(s.current_folder(), root);
        assert_eq!(s.selected(), 1);

        press(&mut s, &[Input::Char('b')]);
        assert_eq!(s.current_folder(), root);
        assert_eq!(s.status_message(), "Already at top level");
    }

    #[test]
    fn test_sort_mode() {
        let now = Local::now();
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        let a = task(&mut tree, root, "A");
        task(&mut tree, root, "B");
        toggle_complete(&mut tree, a, now);
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Char('f'), Input::Char('x')]);
        assert!(matches!(s.mode(), Mode::SortSelecting));
        press(&mut s, &[Input::Esc]);
        assert_eq!(task_names(s.tree(), root), vec!["A", "B"]);

        press(&mut s, &[Input::Char('f'), Input::Char('3')]);
        assert!(matches!(s.mode(), Mode::Browsing));
        assert_eq!(task_names(s.tree(), root), vec!["B", "A"]);
        let reloaded = s.store().load_tree(now).unwrap();
        assert_eq!(task_names(&reloaded, reloaded.root()), vec!["B", "A"]);
    }

    #[test]
    fn test_failed_save_keeps_change_in_memory() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        let id = task(&mut tree, root, "a");
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("missing").join("config.json"));
        let mut s = Session::new(tree, store);

        press(&mut s, &[Input::Enter]);
        assert!(s.tree().task(id).unwrap().completed);
        assert_eq!(s.tree().folder(root).unwrap().status().completed, 1);
        assert!(matches!(s.notice(), Some(Notice::Warning(_))));
    }

    #[test]
    fn test_reload_resets_to_root() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        folder(&mut tree, root, "Sub");
        let (_dir, mut s) = session_with(tree);
        press(&mut s, &[Input::Enter]);
        assert_eq!(s.breadcrumbs().len(), 1);

        let mut other = Tree::new("Root", "");
        let other_root = other.root();
        task(&mut other, other_root, "from disk");
        s.store().save(&other).unwrap();

        press(&mut s, &[Input::Char('r')]);
        assert_eq!(s.current_folder(), s.tree().root());
        assert!(s.breadcrumbs().is_empty());
        assert_eq!(task_names(s.tree(), s.tree().root()), vec!["from disk"]);
    }

    #[test]
    fn test_failed_reload_keeps_tree() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        task(&mut tree, root, "kept");
        let (dir, mut s) = session_with(tree);
        std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

        press(&mut s, &[Input::Char('r')]);
        assert!(matches!(s.notice(), Some(Notice::Warning(_))));
        assert_eq!(task_names(s.tree(), root), vec!["kept"]);
    }

    #[test]
    fn test_preview_and_quit() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        folder(&mut tree, root, "Work");
        task(&mut tree, root, "Loose end");
        let (_dir, mut s) = session_with(tree);

        press(&mut s, &[Input::Char('p')]);
        assert!(s.status_message().starts_with("Task View\n"));
        press(&mut s, &[Input::Down, Input::Char('p')]);
        assert_eq!(s.notice(), Some(&Notice::Info("Cannot preview a task".to_string())));

        assert_eq!(s.handle(Input::Char('q'), Local::now()), Flow::Quit);
        press(&mut s, &[Input::Char('n')]);
        assert_eq!(s.handle(Input::Interrupt, Local::now()), Flow::Quit);
    }

    #[test]
    fn test_title_shows_path_and_summary() {
        let mut tree = Tree::new("Root", "");
        let root = tree.root();
        task(&mut tree, root, "one");
        let (_dir, s) = session_with(tree);
        assert_eq!(s.title(), "Root\n0 overdue, 0/1 completed");
    }
}
