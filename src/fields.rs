//! Enumerations and field types for tasks.
//!
//! Priority levels and the keys a folder's task list can be sorted by.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Priority classification for task importance.
///
/// Variants are declared in ascending order so the derived `Ord` ranks
/// `High` above `None`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    /// Parse the token typed into the priority field.
    ///
    /// An empty token means no priority. Accepts `LOW`, `MED`/`MEDIUM` and
    /// `HIGH` in any case.
    pub fn parse_token(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_uppercase().as_str() {
            "" => Ok(Priority::None),
            "LOW" => Ok(Priority::Low),
            "MED" | "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            _ => Err(ValidationError::InvalidPriority(s.trim().to_string())),
        }
    }

    /// Token used to pre-populate the priority field when editing.
    pub fn token(self) -> &'static str {
        match self {
            Priority::None => "",
            Priority::Low => "LOW",
            Priority::Medium => "MED",
            Priority::High => "HIGH",
        }
    }
}

/// Available sorting options for a folder's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Highest priority first.
    Priority,
    /// Reverse lexical order of names.
    Name,
    /// Incomplete tasks before completed ones, stable within each group.
    Completion,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Priority => "priority",
            SortKey::Name => "name",
            SortKey::Completion => "completion status",
        }
    }
}
