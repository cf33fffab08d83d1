//! Turns person assignments into concrete, collision-free moves.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::executor::transfer_file;
use super::{ItemError, MoveRecord, MoveReport};

/// Directory name used when a person name sanitizes down to nothing.
pub const FALLBACK_PERSON: &str = "Unknown";

/// Everything outside word characters, CJK ideographs, hyphen, period,
/// and space gets stripped from person directory names.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-\x{4e00}-\x{9fa5}\. ]+").unwrap());

/// One entry of a move plan: which file goes to which person.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub path: String,
    pub person: String,
}

/// Failure that invalidates the whole plan rather than one item.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to create destination root {path}: {reason}")]
    DestRoot { path: String, reason: String },
}

/// Makes a person name safe to use as a single directory name.
///
/// Strips disallowed characters and trims whitespace. An empty result
/// falls back to the unsanitized name, then to [`FALLBACK_PERSON`], so
/// a plan item never produces an empty directory component.
pub fn sanitize_person(person: &str) -> String {
    let cleaned = DISALLOWED.replace_all(person, "");
    let cleaned = cleaned.trim();
    if !cleaned.is_empty() {
        cleaned.to_string()
    } else if !person.is_empty() {
        person.to_string()
    } else {
        FALLBACK_PERSON.to_string()
    }
}

/// Probes for a destination that does not collide with an existing
/// file.
///
/// Returns `candidate` untouched when it is free, otherwise the first
/// free `name (N).ext` variant. Existence is re-checked against the
/// filesystem on every probe, so moves executed earlier in the same
/// batch are seen.
pub fn unique_destination(candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }

    let stem = candidate
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let probe = candidate.with_file_name(format!("{} ({}){}", stem, counter, ext));
        if !probe.exists() {
            return probe;
        }
        counter += 1;
    }
}

/// Executes a move plan: one subdirectory of `dest_root` per person,
/// one move per valid item.
///
/// Item failures are collected, never propagated; a bad entry cannot
/// stop the rest of the batch. With `dry_run` the returned report is
/// identical but nothing on disk changes beyond creating the
/// destination root.
pub fn execute_plan(
    items: &[PlanItem],
    dest_root: &Path,
    dry_run: bool,
) -> Result<MoveReport, PlanError> {
    fs::create_dir_all(dest_root).map_err(|e| PlanError::DestRoot {
        path: dest_root.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut report = MoveReport::default();
    for item in items {
        if item.path.trim().is_empty() {
            report.errors.push(ItemError {
                path: item.path.clone(),
                error: "source path is empty".to_string(),
            });
            continue;
        }
        if item.person.trim().is_empty() {
            report.errors.push(ItemError {
                path: item.path.clone(),
                error: "no person assigned".to_string(),
            });
            continue;
        }

        let source = Path::new(&item.path);
        if !source.is_file() {
            report.errors.push(ItemError {
                path: item.path.clone(),
                error: "source file does not exist".to_string(),
            });
            continue;
        }
        let Some(file_name) = source.file_name() else {
            report.errors.push(ItemError {
                path: item.path.clone(),
                error: "source path has no file name".to_string(),
            });
            continue;
        };

        let person_dir = dest_root.join(sanitize_person(&item.person));
        let target = unique_destination(&person_dir.join(file_name));

        if dry_run {
            report.moved.push(MoveRecord {
                from: item.path.clone(),
                to: target.display().to_string(),
            });
            continue;
        }

        match transfer_file(source, &target) {
            Ok(()) => {
                tracing::debug!(from = %item.path, to = %target.display(), "Moved image");
                report.moved.push(MoveRecord {
                    from: item.path.clone(),
                    to: target.display().to_string(),
                });
            }
            Err(err) => {
                tracing::warn!(path = %item.path, error = %err, "Move failed");
                report.errors.push(ItemError {
                    path: item.path.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        moved = report.moved.len(),
        errors = report.errors.len(),
        dry_run,
        dest_root = %dest_root.display(),
        "Plan executed"
    );
    Ok(report)
}
