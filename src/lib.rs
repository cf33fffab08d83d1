//! Sortrait sorts photo libraries into per-person folders using the
//! people tags embedded in image metadata.
//!
//! The crate is a Tauri shell around four services: a scan pipeline
//! (directory walk plus metadata extraction), a move organizer with
//! collision-safe planning and undo, an in-memory move history, and a
//! thumbnail cache.

pub mod commands;
pub mod history;
pub mod metadata;
pub mod organizer;
pub mod pipeline;
pub mod scanner;
pub mod state;
pub mod thumbs;

use std::sync::Arc;

use tauri::Manager;
use tracing_subscriber::EnvFilter;

use crate::history::MoveLedger;
use crate::metadata::ExiftoolSource;
use crate::state::{HistoryState, MetadataState, ScanRegistry, ThumbnailState};
use crate::thumbs::ThumbnailCache;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "sortrait_lib=info".into()),
        )
        .init();

    tauri::Builder::default()
        .manage(MetadataState(Arc::new(ExiftoolSource::probe())))
        .manage(HistoryState::new(MoveLedger::default()))
        .manage(ScanRegistry::new())
        .setup(|app| {
            let cache_dir = app.path().app_cache_dir()?.join("thumbnails");
            app.manage(ThumbnailState(Arc::new(ThumbnailCache::new(cache_dir)?)));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::scan_source,
            commands::scan_source_stream,
            commands::cancel_scan,
            commands::backend_status,
            commands::move_images,
            commands::undo_moves,
            commands::history_status,
            commands::get_thumbnail,
            commands::clear_thumbnail_cache,
            commands::thumbnail_cache_stats,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
