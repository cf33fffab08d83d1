//! exiftool subprocess adapter.
//!
//! Each extraction runs `exiftool -json` on one file and mines the
//! returned document for person names and keyword tags. Photo software
//! disagrees wildly about where these live, so a list of known fields
//! is checked for each, plus a regex fallback over face-region structs.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{dedup_preserving, split_multi, MetadataError, MetadataSource, PersonTags};

/// Metadata fields that carry person names, in priority order.
const PEOPLE_FIELDS: [&str; 6] = [
    "RegionName",
    "PersonInImage",
    "PersonDisplayName",
    "RegionPersonDisplayName",
    "FaceName",
    "PeopleKeywords",
];

/// Metadata fields that carry keyword tags, in priority order.
const TAG_FIELDS: [&str; 7] = [
    "Keywords",
    "XPKeywords",
    "Subject",
    "HierarchicalSubject",
    "TagsList",
    "CatalogSets",
    "LastKeywordXMP",
];

/// Pulls `"Name": "..."` pairs out of serialized face-region structs.
static REGION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""Name"\s*:\s*"([^"]+)""#).unwrap());

/// Metadata source backed by the exiftool command-line program.
pub struct ExiftoolSource {
    version: Option<String>,
}

impl ExiftoolSource {
    /// Probes for exiftool on PATH. The answer is cached for the
    /// lifetime of the value; a backend installed later is not picked
    /// up until restart.
    pub fn probe() -> Self {
        let version = match Command::new("exiftool").arg("-ver").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                tracing::info!(version = %version, "exiftool backend detected");
                Some(version)
            }
            Ok(output) => {
                tracing::warn!(status = %output.status, "exiftool probe failed, scanning is disabled");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "exiftool not found on PATH, scanning is disabled");
                None
            }
        };
        Self { version }
    }
}

impl MetadataSource for ExiftoolSource {
    fn is_available(&self) -> bool {
        self.version.is_some()
    }

    fn version(&self) -> Option<String> {
        self.version.clone()
    }

    fn extract(&self, path: &Path) -> Result<PersonTags, MetadataError> {
        if !self.is_available() {
            return Err(MetadataError::BackendUnavailable);
        }

        let output = Command::new("exiftool")
            .args(["-json", "-charset", "utf8", "-ignoreMinorErrors"])
            .arg(path)
            .output()
            .map_err(|e| MetadataError::Subprocess {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(MetadataError::Subprocess {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // exiftool -json always emits an array, one document per input.
        let documents: Vec<Value> =
            serde_json::from_slice(&output.stdout).map_err(|e| MetadataError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let document = documents.first().ok_or_else(|| MetadataError::Parse {
            path: path.display().to_string(),
            reason: "empty document array".to_string(),
        })?;

        Ok(parse_person_tags(document))
    }
}

/// Collects people and tags from one exiftool JSON document.
fn parse_person_tags(document: &Value) -> PersonTags {
    let mut people = Vec::new();
    for field in PEOPLE_FIELDS {
        collect_field(document.get(field), &mut people);
    }

    // Face regions may only be present as a nested RegionInfo struct.
    if let Some(region) = document.get("RegionInfo") {
        let text = match region {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        for capture in REGION_NAME.captures_iter(&text) {
            if let Some(name) = capture.get(1) {
                let name = name.as_str().trim();
                if !name.is_empty() {
                    people.push(name.to_string());
                }
            }
        }
    }

    let mut tags = Vec::new();
    for field in TAG_FIELDS {
        collect_field(document.get(field), &mut tags);
    }

    PersonTags {
        people: dedup_preserving(people),
        tags: dedup_preserving(tags),
    }
}

/// Appends the fragments of one metadata field value.
///
/// Strings are split on the multi-value delimiter; arrays contribute
/// one fragment per element. Other shapes are ignored.
fn collect_field(value: Option<&Value>, out: &mut Vec<String>) {
    match value {
        Some(Value::String(text)) => out.extend(split_multi(text)),
        Some(Value::Array(items)) => {
            for item in items {
                let text = match item {
                    Value::String(text) => text.trim().to_string(),
                    Value::Number(number) => number.to_string(),
                    _ => continue,
                };
                if !text.is_empty() {
                    out.push(text);
                }
            }
        }
        _ => {}
    }
}
