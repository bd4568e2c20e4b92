//! Field buffers for creating or editing a task or folder.
//!
//! Tasks cycle through name, description, due date and priority; folders
//! only have name and description.

use crate::db::format_due_input;
use crate::error::ValidationError;
use crate::ops::ItemFields;
use crate::tree::{ItemId, Tree};
use crate::tui::input::InputField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Task,
    Folder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Name,
    Description,
    DueDate,
    Priority,
}

impl FieldId {
    pub fn label(self) -> &'static str {
        match self {
            FieldId::Name => "Name *",
            FieldId::Description => "Description",
            FieldId::DueDate => "Due (DD/MM/YY HH:MM)",
            FieldId::Priority => "Priority (LOW/MED/HIGH)",
        }
    }
}

const TASK_FIELDS: [FieldId; 4] = [FieldId::Name, FieldId::Description, FieldId::DueDate, FieldId::Priority];
const FOLDER_FIELDS: [FieldId; 2] = [FieldId::Name, FieldId::Description];

#[derive(Debug, Clone)]
pub struct ItemForm {
    kind: ItemKind,
    /// The item being edited; `None` while creating.
    target: Option<ItemId>,
    focus: FieldId,
    pub name: InputField,
    pub description: InputField,
    pub due_date: InputField,
    pub priority: InputField,
    /// Last rejected commit, shown inline.
    pub error: Option<ValidationError>,
}

impl ItemForm {
    /// Empty form for a new item.
    pub fn create(kind: ItemKind) -> Self {
        ItemForm {
            kind,
            target: None,
            focus: FieldId::Name,
            name: InputField::new(),
            description: InputField::new(),
            due_date: InputField::new(),
            priority: InputField::new(),
            error: None,
        }
    }

    /// Form pre-populated from an existing item.
    pub fn edit(tree: &Tree, item: ItemId) -> Option<Self> {
        let form = match item {
            ItemId::Folder(id) => {
                let folder = tree.folder(id)?;
                let mut form = Self::create(ItemKind::Folder);
                form.name = InputField::with_value(&folder.name);
                form.description = InputField::with_value(&folder.description);
                form
            }
            ItemId::Task(id) => {
                let task = tree.task(id)?;
                let mut form = Self::create(ItemKind::Task);
                form.name = InputField::with_value(&task.name);
                form.description = InputField::with_value(&task.description);
                form.due_date = InputField::with_value(&task.due.map(format_due_input).unwrap_or_default());
                form.priority = InputField::with_value(task.priority.token());
                form
            }
        };
        Some(ItemForm {
            target: Some(item),
            ..form
        })
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn target(&self) -> Option<ItemId> {
        self.target
    }

    pub fn is_editing(&self) -> bool {
        self.target.is_some()
    }

    pub fn focus(&self) -> FieldId {
        self.focus
    }

    /// Fields shown for the current kind, in focus order.
    pub fn fields(&self) -> &'static [FieldId] {
        match self.kind {
            ItemKind::Task => &TASK_FIELDS,
            ItemKind::Folder => &FOLDER_FIELDS,
        }
    }

    fn focus_index(&self) -> usize {
        self.fields().iter().position(|f| *f == self.focus).unwrap_or(0)
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        self.focus = fields[(self.focus_index() + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.fields();
        let i = self.focus_index();
        self.focus = fields[if i == 0 { fields.len() - 1 } else { i - 1 }];
    }

    /// Switch a new item between task and folder. Returns `false` when
    /// editing an existing item, whose kind is fixed.
    pub fn toggle_kind(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        self.kind = match self.kind {
            ItemKind::Task => ItemKind::Folder,
            ItemKind::Folder => ItemKind::Task,
        };
        self.focus = FieldId::Name;
        true
    }

    pub fn field(&self, id: FieldId) -> &InputField {
        match id {
            FieldId::Name => &self.name,
            FieldId::Description => &self.description,
            FieldId::DueDate => &self.due_date,
            FieldId::Priority => &self.priority,
        }
    }

    fn focused_mut(&mut self) -> &mut InputField {
        match self.focus {
            FieldId::Name => &mut self.name,
            FieldId::Description => &mut self.description,
            FieldId::DueDate => &mut self.due_date,
            FieldId::Priority => &mut self.priority,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.focused_mut().handle_char(c);
    }

    pub fn handle_backspace(&mut self) {
        self.focused_mut().handle_backspace();
    }

    pub fn handle_delete(&mut self) {
        self.focused_mut().handle_delete();
    }

    pub fn handle_left_right(&mut self, right: bool) {
        if right {
            self.focused_mut().move_cursor_right();
        } else {
            self.focused_mut().move_cursor_left();
        }
    }

    /// Collected values, with task-only fields blanked for folders.
    pub fn values(&self) -> ItemFields {
        let mut fields = ItemFields::new(&self.name.value, &self.description.value);
        if self.kind == ItemKind::Task {
            fields.due_date = self.due_date.value.clone();
            fields.priority = self.priority.value.clone();
        }
        fields
    }
}
