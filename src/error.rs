//! Error types shared across the model, persistence and session layers.

use std::path::PathBuf;

/// Rejected user input. Reported inline; no mutation is applied.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,
    #[error("invalid date '{0}', expected DD/MM/YY HH:MM")]
    InvalidDueDate(String),
    #[error("invalid priority '{0}', expected LOW, MED or HIGH")]
    InvalidPriority(String),
}

/// Failure reading or writing the state file.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode task tree: {0}")]
    Encode(#[from] serde_json::Error),
}
