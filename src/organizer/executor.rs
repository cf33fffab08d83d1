//! Copy-then-delete file transfer with rollback.
//!
//! Copying instead of renaming keeps moves working across filesystem
//! boundaries. When the delete half fails, the copied target is removed
//! again, so a failed move never leaves two live copies of a file.

use std::fs;
use std::path::Path;

use filetime::FileTime;
use thiserror::Error;

/// A failed file transfer. The source file is intact in every variant.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to create directory {path}: {reason}")]
    CreateDir { path: String, reason: String },
    #[error("failed to copy {from} to {to}: {reason}")]
    Copy {
        from: String,
        to: String,
        reason: String,
    },
    #[error("failed to remove source {path} after copy: {reason}")]
    RemoveSource { path: String, reason: String },
}

/// Moves `from` to `to` by copy-then-delete.
///
/// The parent directory of `to` is created when missing, and source
/// timestamps are carried over on a best-effort basis. Identical
/// endpoints are a no-op.
pub fn transfer_file(from: &Path, to: &Path) -> Result<(), TransferError> {
    let from_abs = std::path::absolute(from).unwrap_or_else(|_| from.to_path_buf());
    let to_abs = std::path::absolute(to).unwrap_or_else(|_| to.to_path_buf());
    if from_abs == to_abs {
        return Ok(());
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| TransferError::CreateDir {
            path: parent.display().to_string(),
            reason: e.to_string(),
        })?;
    }

    let timestamps = fs::metadata(from)
        .map(|meta| {
            (
                FileTime::from_last_access_time(&meta),
                FileTime::from_last_modification_time(&meta),
            )
        })
        .ok();

    fs::copy(from, to).map_err(|e| TransferError::Copy {
        from: from.display().to_string(),
        to: to.display().to_string(),
        reason: e.to_string(),
    })?;

    // Timestamp loss is not worth failing the move over.
    if let Some((atime, mtime)) = timestamps {
        if let Err(err) = filetime::set_file_times(to, atime, mtime) {
            tracing::warn!(path = %to.display(), error = %err, "Could not preserve file times");
        }
    }

    if let Err(err) = fs::remove_file(from) {
        // Roll back the copy so the move stays all-or-nothing.
        if let Err(rollback) = fs::remove_file(to) {
            tracing::warn!(path = %to.display(), error = %rollback, "Rollback of copied file failed");
        }
        return Err(TransferError::RemoveSource {
            path: from.display().to_string(),
            reason: err.to_string(),
        });
    }

    Ok(())
}
