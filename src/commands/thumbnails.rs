//! Thumbnail commands.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tauri::State;

use crate::state::ThumbnailState;
use crate::thumbs::{CacheStats, DEFAULT_THUMBNAIL_SIZE};

/// Returns the thumbnail for `path` as a `data:image/jpeg;base64,` URL.
#[tauri::command]
pub async fn get_thumbnail(
    path: String,
    size: Option<u32>,
    thumbs: State<'_, ThumbnailState>,
) -> Result<String, String> {
    let cache = thumbs.0.clone();

    // Run thumbnail generation in a blocking task to not block the async runtime
    tokio::task::spawn_blocking(move || {
        let entry = cache
            .get_or_build(Path::new(&path), size.unwrap_or(DEFAULT_THUMBNAIL_SIZE))
            .map_err(|e| e.to_string())?;
        let bytes = fs::read(&entry).map_err(|e| e.to_string())?;
        Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)))
    })
    .await
    .map_err(|e| format!("Task failed: {}", e))?
}

#[tauri::command]
pub async fn clear_thumbnail_cache(thumbs: State<'_, ThumbnailState>) -> Result<u64, String> {
    let cache = thumbs.0.clone();
    tokio::task::spawn_blocking(move || cache.clear().map_err(|e| e.to_string()))
        .await
        .map_err(|e| format!("Task failed: {}", e))?
}

#[tauri::command]
pub async fn thumbnail_cache_stats(
    thumbs: State<'_, ThumbnailState>,
) -> Result<CacheStats, String> {
    let cache = thumbs.0.clone();
    tokio::task::spawn_blocking(move || cache.stats().map_err(|e| e.to_string()))
        .await
        .map_err(|e| format!("Task failed: {}", e))?
}
