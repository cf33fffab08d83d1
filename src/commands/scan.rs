//! Scan commands: batch, streaming, cancellation, backend status.

use std::path::PathBuf;

use serde::Serialize;
use tauri::ipc::Channel;
use tauri::State;

use crate::pipeline::{self, ScanEvent, ScanItem};
use crate::state::{MetadataState, ScanRegistry};

/// Batch scan result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub ok: bool,
    pub items: Vec<ScanItem>,
}

/// Availability of the metadata backend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub available: bool,
    pub version: Option<String>,
}

#[tauri::command]
pub async fn scan_source(
    source_dir: String,
    metadata: State<'_, MetadataState>,
) -> Result<ScanResponse, String> {
    let source = PathBuf::from(source_dir);
    let backend = metadata.0.clone();

    let items =
        tokio::task::spawn_blocking(move || pipeline::scan_directory(&source, backend.as_ref()))
            .await
            .map_err(|e| format!("Task failed: {}", e))?
            .map_err(|e| e.to_string())?;

    Ok(ScanResponse { ok: true, items })
}

/// Starts a streaming scan and returns its id. Events arrive on
/// `on_event`; the scan stops early on `cancel_scan` or when the
/// channel consumer goes away.
#[tauri::command]
pub async fn scan_source_stream(
    source_dir: String,
    on_event: Channel<ScanEvent>,
    metadata: State<'_, MetadataState>,
    registry: State<'_, ScanRegistry>,
) -> Result<u64, String> {
    let source = PathBuf::from(source_dir);
    let backend = metadata.0.clone();

    // Reject bad invocations before handing out a scan id.
    pipeline::check_preconditions(&source, backend.as_ref()).map_err(|e| e.to_string())?;

    let registry = registry.inner().clone();
    let (scan_id, cancel) = registry.register();

    tokio::task::spawn_blocking(move || {
        let result = pipeline::stream_scan(&source, backend.as_ref(), &cancel, |event| {
            on_event.send(event).is_ok()
        });
        if let Err(err) = result {
            tracing::warn!(scan_id, error = %err, "Streaming scan aborted");
        }
        registry.finish(scan_id);
    });

    Ok(scan_id)
}

/// Flags a running scan to stop. Returns false for unknown ids.
#[tauri::command]
pub fn cancel_scan(scan_id: u64, registry: State<'_, ScanRegistry>) -> bool {
    let cancelled = registry.cancel(scan_id);
    if cancelled {
        tracing::info!(scan_id, "Scan cancellation requested");
    }
    cancelled
}

#[tauri::command]
pub fn backend_status(metadata: State<'_, MetadataState>) -> BackendStatus {
    BackendStatus {
        available: metadata.0.is_available(),
        version: metadata.0.version(),
    }
}
