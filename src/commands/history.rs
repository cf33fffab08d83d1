//! Undo and history inspection commands.

use serde::Serialize;
use tauri::State;

use crate::organizer::undo::{undo_recent, RestoreStrategy};
use crate::organizer::{ItemError, MoveRecord};
use crate::state::HistoryState;

/// Outcome of an undo call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResponse {
    pub ok: bool,
    pub undone: Vec<MoveRecord>,
    pub errors: Vec<ItemError>,
    pub undone_batches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A summary of the most recent recorded batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub id: String,
    pub executed_at: String,
    pub dest_root: String,
    pub moved: usize,
}

/// Ledger occupancy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub batches: usize,
    pub capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<BatchSummary>,
}

/// Undoes the `count` most recent move batches (default one).
#[tauri::command]
pub async fn undo_moves(
    count: Option<usize>,
    strategy: Option<RestoreStrategy>,
    history: State<'_, HistoryState>,
) -> Result<UndoResponse, String> {
    let count = count.unwrap_or(1);
    if count == 0 {
        return Err("undo count must be at least 1".to_string());
    }
    let strategy = strategy.unwrap_or_default();
    let ledger = history.0.clone();

    let report = tokio::task::spawn_blocking(move || {
        // One lock for the whole undo: nothing can record into the
        // ledger while batches are being popped and restored.
        let mut ledger = ledger.lock().map_err(|e| e.to_string())?;
        Ok::<_, String>(undo_recent(&mut ledger, count, strategy))
    })
    .await
    .map_err(|e| format!("Task failed: {}", e))??;

    let message = if report.undone_batches == 0 {
        Some("Nothing to undo".to_string())
    } else {
        None
    };

    Ok(UndoResponse {
        ok: report.errors.is_empty(),
        undone: report.undone,
        errors: report.errors,
        undone_batches: report.undone_batches,
        message,
    })
}

#[tauri::command]
pub fn history_status(history: State<'_, HistoryState>) -> Result<HistoryStatus, String> {
    let ledger = history.0.lock().map_err(|e| e.to_string())?;
    Ok(HistoryStatus {
        batches: ledger.len(),
        capacity: ledger.capacity(),
        latest: ledger.latest().map(|batch| BatchSummary {
            id: batch.id.to_string(),
            executed_at: batch.executed_at.to_rfc3339(),
            dest_root: batch.dest_root.clone(),
            moved: batch.moved.len(),
        }),
    })
}
