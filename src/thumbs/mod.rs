//! Disk-backed thumbnail cache keyed by source file identity.
//!
//! Cache entries are JPEG files named by a hash of the source path,
//! modification time, size, and requested edge length. Editing or
//! replacing a source photo changes the hash, so stale thumbnails are
//! never served and never need explicit invalidation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::scanner;

/// Thumbnail edge length used when the caller does not pick one.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 256;

const JPEG_QUALITY: u8 = 85;

/// Why a thumbnail could not be produced.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("not an existing file: {0}")]
    SourceMissing(String),
    #[error("not a supported image type: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("failed to encode thumbnail for {path}: {reason}")]
    Encode { path: String, reason: String },
}

/// Usage counters for the cache directory.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: u64,
    pub total_bytes: u64,
}

/// A thumbnail cache rooted at one directory.
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    /// Opens the cache, creating the directory when missing.
    pub fn new(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the on-disk JPEG for `path` at `size`, building it on a
    /// cache miss. Validation mirrors the scan filter: only existing,
    /// supported image files get thumbnails.
    pub fn get_or_build(&self, path: &Path, size: u32) -> Result<PathBuf, ThumbnailError> {
        if !path.is_file() {
            return Err(ThumbnailError::SourceMissing(path.display().to_string()));
        }
        if !scanner::is_supported_image(path) {
            return Err(ThumbnailError::UnsupportedFormat(path.display().to_string()));
        }

        let entry = self.dir.join(format!("{}.jpg", cache_key(path, size)?));
        if entry.is_file() {
            return Ok(entry);
        }

        self.build(path, size, &entry)?;
        Ok(entry)
    }

    /// Deletes every cache entry, returning how many were removed.
    pub fn clear(&self) -> io::Result<u64> {
        let mut removed = 0u64;
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_file() {
                fs::remove_file(dir_entry.path())?;
                removed += 1;
            }
        }
        tracing::info!(removed, "Thumbnail cache cleared");
        Ok(removed)
    }

    /// Counts entries and bytes currently cached.
    pub fn stats(&self) -> io::Result<CacheStats> {
        let mut stats = CacheStats::default();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_file() {
                stats.entries += 1;
                stats.total_bytes += dir_entry.metadata()?.len();
            }
        }
        Ok(stats)
    }

    fn build(&self, path: &Path, size: u32, entry: &Path) -> Result<(), ThumbnailError> {
        let img = image::open(path).map_err(|e| ThumbnailError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Scale to cover the square, then center-crop.
        let thumb = img.resize_to_fill(size, size, FilterType::Lanczos3).to_rgb8();

        let file = fs::File::create(entry).map_err(|e| ThumbnailError::Io {
            path: entry.display().to_string(),
            reason: e.to_string(),
        })?;
        let encoder = JpegEncoder::new_with_quality(file, JPEG_QUALITY);
        thumb
            .write_with_encoder(encoder)
            .map_err(|e| ThumbnailError::Encode {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), size, "Built thumbnail");
        Ok(())
    }
}

/// Cache key: hash of source identity (path, mtime, size) plus the
/// requested edge length.
fn cache_key(path: &Path, size: u32) -> Result<String, ThumbnailError> {
    let meta = fs::metadata(path).map_err(|e| ThumbnailError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mtime_ns = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let identity = format!("{}|{}|{}|{}", path.display(), mtime_ns, meta.len(), size);
    Ok(format!("{:x}", Sha256::digest(identity.as_bytes())))
}
