//! Metadata extraction: who is in a photo and how it is tagged.

mod exiftool;

pub use exiftool::ExiftoolSource;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// People and tags read from one image file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonTags {
    pub people: Vec<String>,
    pub tags: Vec<String>,
}

/// Errors surfaced by a metadata source.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata backend is not available, install exiftool and make sure it is on PATH")]
    BackendUnavailable,
    #[error("failed to run metadata backend on {path}: {reason}")]
    Subprocess { path: String, reason: String },
    #[error("failed to parse metadata output for {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// A source of per-image people/tag metadata.
///
/// The production implementation shells out to exiftool; tests
/// substitute an in-memory map. Availability is probed once at startup
/// and does not change for the lifetime of the process.
pub trait MetadataSource: Send + Sync {
    /// Whether the backend can serve extraction requests at all.
    fn is_available(&self) -> bool;

    /// Backend version string, when one is known.
    fn version(&self) -> Option<String> {
        None
    }

    /// Reads people and tags for a single image.
    fn extract(&self, path: &Path) -> Result<PersonTags, MetadataError>;
}

/// Splits a scalar metadata value into fragments.
///
/// Semicolon wins over comma as the delimiter; a value containing
/// neither is a single fragment. Fragments are trimmed and empties
/// dropped.
pub(crate) fn split_multi(value: &str) -> Vec<String> {
    let parts: Vec<&str> = if value.contains(';') {
        value.split(';').collect()
    } else if value.contains(',') {
        value.split(',').collect()
    } else {
        vec![value]
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Order-preserving, case-sensitive dedup.
pub(crate) fn dedup_preserving(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolon_before_comma() {
        assert_eq!(split_multi("Alice; Bob"), vec!["Alice", "Bob"]);
        assert_eq!(split_multi("Alice, Bob"), vec!["Alice", "Bob"]);
        assert_eq!(split_multi("a, b; c"), vec!["a, b", "c"]);
    }

    #[test]
    fn unsplit_values_pass_through_trimmed() {
        assert_eq!(split_multi("  Alice  "), vec!["Alice"]);
        assert!(split_multi("   ").is_empty());
    }

    #[test]
    fn dropped_fragments_do_not_leave_holes() {
        assert_eq!(split_multi("Alice;;Bob; "), vec!["Alice", "Bob"]);
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let values = vec![
            "Bob".to_string(),
            "alice".to_string(),
            "Bob".to_string(),
            "Alice".to_string(),
        ];
        assert_eq!(dedup_preserving(values), vec!["Bob", "alice", "Alice"]);
    }
}
