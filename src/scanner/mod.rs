//! Directory walking and image-path filtering.
//!
//! The scanner owns the answer to one question: which files under a
//! root are candidate photos. Everything downstream (metadata
//! extraction, planning, thumbnails) trusts this filter instead of
//! re-checking extensions.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// File extensions treated as photos, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 8] = [
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff",
];

/// Returns true when the path carries a supported image extension.
///
/// Purely lexical, so it also works on paths that do not exist yet.
/// Files without an extension are rejected.
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|supported| *supported == ext)
        }
        None => false,
    }
}

/// Walks `root` recursively and yields the absolute path of every
/// supported image file.
///
/// Symlinks are never followed, so a link cycle cannot hang the walk.
/// Unreadable entries are logged and skipped rather than aborting the
/// traversal. The iterator is lazy; construct a new one to re-walk.
pub fn walk_images(root: &Path) -> impl Iterator<Item = PathBuf> {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable entry during walk");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported_image(path))
}
