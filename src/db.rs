//! Persistence of the task tree and date utilities.
//!
//! The tree is stored as a single JSON document whose root object is the
//! root folder. Folders nest their tasks and subfolders in display order.
//! Parent links are never written; [`Tree::reconstruct`] rebuilds them
//! after every load.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PersistenceError, ValidationError};
use crate::status::Status;
use crate::task::Task;
use crate::tree::Tree;

/// Format of the due-date field, e.g. `31/01/99 10:00`.
pub const DUE_INPUT_FORMAT: &str = "%d/%m/%y %H:%M";

/// Detached, serializable form of a folder and everything beneath it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub children_tasks: Vec<Task>,
    #[serde(default)]
    pub children_task_folders: Vec<FolderRecord>,
}

/// Serialize a detached tree to the document format.
pub fn encode(record: &FolderRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}

/// Parse a document into a detached tree. The result has no parent links
/// and must go through [`Tree::reconstruct`] before use.
pub fn decode(data: &str) -> Result<FolderRecord, serde_json::Error> {
    serde_json::from_str(data)
}

/// The state file backing a session.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the state file. A missing or unparsable file is an error.
    pub fn load(&self) -> Result<FolderRecord, PersistenceError> {
        let data = fs::read_to_string(&self.path).map_err(|source| PersistenceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let record = decode(&data).map_err(|source| PersistenceError::Parse {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "loaded task tree");
        Ok(record)
    }

    /// Load and reconstruct in one step.
    pub fn load_tree(&self, now: DateTime<Local>) -> Result<Tree, PersistenceError> {
        Ok(Tree::reconstruct(self.load()?, now))
    }

    /// Write the whole tree using an atomic write (temp file + rename).
    pub fn save(&self, tree: &Tree) -> Result<(), PersistenceError> {
        let data = encode(&tree.to_record())?;
        let tmp = self.path.with_extension("json.tmp");
        let write = |target: &Path| -> std::io::Result<()> {
            let mut f = File::create(target)?;
            f.write_all(data.as_bytes())?;
            f.flush()?;
            fs::rename(target, &self.path)
        };
        write(&tmp).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bytes = data.len(), "saved task tree");
        Ok(())
    }
}

/// Parse the due-date field. An empty field means no due date.
pub fn parse_due_input(s: &str) -> Result<Option<DateTime<Local>>, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let naive = NaiveDateTime::parse_from_str(s, DUE_INPUT_FORMAT)
        .map_err(|_| ValidationError::InvalidDueDate(s.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidDueDate(s.to_string()))
}

/// Format a due date the way the due-date field accepts it.
pub fn format_due_input(due: DateTime<Local>) -> String {
    due.format(DUE_INPUT_FORMAT).to_string()
}

/// Serde adapter for optional due dates.
///
/// Dates are written as RFC 3339. On read, a zero timestamp (year 1) counts
/// as "no due date", and offset-less timestamps are taken as local time.
pub mod due_date {
    use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(due: &Option<DateTime<Local>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match due {
            Some(d) => serializer.serialize_str(&d.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Local>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let parsed = match DateTime::parse_from_rfc3339(raw) {
            Ok(d) => {
                if d.year() <= 1 {
                    return Ok(None);
                }
                d.with_timezone(&Local)
            }
            Err(_) => {
                let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .map_err(|e| de::Error::custom(format!("invalid due date '{raw}': {e}")))?;
                Local
                    .from_local_datetime(&naive)
                    .earliest()
                    .ok_or_else(|| de::Error::custom(format!("nonexistent local time '{raw}'")))?
            }
        };
        Ok(Some(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::tree::ItemId;
    use chrono::{Datelike, Duration, Timelike};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_tree() -> Tree {
        let now = Local::now();
        let mut milk = Task::new("Milk", "2%");
        milk.completed = true;
        let mut report = Task::new("Q3 report", "Submit to management");
        report.priority = Priority::High;
        report.due = Some(now - Duration::hours(3));
        let record = FolderRecord {
            name: "Root".into(),
            description: "everything".into(),
            status: Status::default(),
            children_tasks: vec![Task::new("Call mom", "")],
            children_task_folders: vec![
                FolderRecord {
                    name: "Groceries".into(),
                    description: "Things to buy".into(),
                    children_tasks: vec![Task::new("Eggs", ""), milk],
                    ..FolderRecord::default()
                },
                FolderRecord {
                    name: "Work".into(),
                    children_tasks: vec![report],
                    children_task_folders: vec![FolderRecord {
                        name: "Archive".into(),
                        ..FolderRecord::default()
                    }],
                    ..FolderRecord::default()
                },
            ],
        };
        Tree::reconstruct(record, now)
    }

    /// Structural fingerprint: names, descriptions, statuses and order.
    fn shape(tree: &Tree) -> Vec<String> {
        fn walk(tree: &Tree, folder: crate::tree::FolderId, depth: usize, out: &mut Vec<String>) {
            let f = tree.folder(folder).unwrap();
            out.push(format!("{}{}|{}|{:?}", " ".repeat(depth), f.name, f.description, f.status()));
            for (_, t) in tree.tasks_in(folder) {
                out.push(format!(
                    "{} -{}|{}|{}|{:?}|{:?}",
                    " ".repeat(depth),
                    t.name,
                    t.description,
                    t.completed,
                    t.priority,
                    t.due.map(|d| d.timestamp())
                ));
            }
            for (child, _) in tree.folders_in(folder) {
                walk(tree, child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        walk(tree, tree.root(), 0, &mut out);
        out
    }

    #[test]
    fn test_save_load_reconstruct_preserves_tree() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("config.json"));
        let tree = sample_tree();
        store.save(&tree).unwrap();

        let loaded = store.load_tree(Local::now()).unwrap();
        assert_eq!(shape(&loaded), shape(&tree));

        let root = loaded.root();
        assert_eq!(loaded.folder(root).unwrap().parent(), None);
        for (folder_id, _) in loaded.folders_in(root) {
            assert_eq!(loaded.parent_of(ItemId::Folder(folder_id)), Some(root));
            for (task_id, _) in loaded.tasks_in(folder_id) {
                assert_eq!(loaded.parent_of(ItemId::Task(task_id)), Some(folder_id));
            }
            for (sub, _) in loaded.folders_in(folder_id) {
                assert_eq!(loaded.parent_of(ItemId::Folder(sub)), Some(folder_id));
            }
        }
    }

    #[test]
    fn test_document_omits_parent_links() {
        let data = encode(&sample_tree().to_record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        let groceries = &value["children_task_folders"][0];
        assert_eq!(groceries["name"], "Groceries");
        assert!(groceries.get("parent").is_none());
        assert!(groceries["children_tasks"][0].get("folder").is_none());
        assert_eq!(groceries["status"]["total"], 2);
        assert_eq!(groceries["status"]["completed"], 1);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("nope.json"));
        assert!(matches!(store.load(), Err(PersistenceError::Read { .. })));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ \"name\": ").unwrap();
        let store = Store::new(&path);
        assert!(matches!(store.load(), Err(PersistenceError::Parse { .. })));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("missing").join("config.json"));
        assert!(matches!(store.save(&sample_tree()), Err(PersistenceError::Write { .. })));
    }

    #[test]
    fn test_minimal_document_defaults() {
        let record = decode(r#"{"name":"Root","children_tasks":[{"name":"solo"}]}"#).unwrap();
        assert_eq!(record.children_tasks.len(), 1);
        let task = &record.children_tasks[0];
        assert_eq!(task.description, "");
        assert!(!task.completed);
        assert_eq!(task.due, None);
        assert_eq!(task.priority, Priority::None);
        assert!(record.children_task_folders.is_empty());
    }

    #[test]
    fn test_zero_due_date_reads_as_unset() {
        let record = decode(
            r#"{"name":"Root","children_tasks":[{"name":"a","due_date":"0001-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(record.children_tasks[0].due, None);
    }

    #[test]
    fn test_parse_due_input() {
        let due = parse_due_input("31/01/99 10:00").unwrap().unwrap();
        assert_eq!((due.year(), due.month(), due.day()), (1999, 1, 31));
        assert_eq!((due.hour(), due.minute()), (10, 0));
        assert_eq!(format_due_input(due), "31/01/99 10:00");

        assert_eq!(parse_due_input("  ").unwrap(), None);
        assert_eq!(
            parse_due_input("1999-01-31"),
            Err(ValidationError::InvalidDueDate("1999-01-31".into()))
        );
        assert!(parse_due_input("32/01/99 10:00").is_err());
    }
}
