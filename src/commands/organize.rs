//! Move execution command.

use std::path::PathBuf;

use serde::Serialize;
use tauri::State;

use crate::history::MoveBatch;
use crate::organizer::planner::{execute_plan, PlanItem};
use crate::organizer::{ItemError, MoveRecord};
use crate::state::HistoryState;

/// Outcome of a move call, mirroring the executed plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub ok: bool,
    pub moved: Vec<MoveRecord>,
    pub errors: Vec<ItemError>,
}

/// Moves planned images into per-person folders under `dest_root`.
///
/// Runs with at least one successful move are recorded in history so
/// they can be undone; dry runs are never recorded.
#[tauri::command]
pub async fn move_images(
    plan: Vec<PlanItem>,
    dest_root: String,
    dry_run: Option<bool>,
    history: State<'_, HistoryState>,
) -> Result<MoveResponse, String> {
    let dry_run = dry_run.unwrap_or(false);
    let dest = PathBuf::from(&dest_root);

    let report = tokio::task::spawn_blocking(move || execute_plan(&plan, &dest, dry_run))
        .await
        .map_err(|e| format!("Task failed: {}", e))?
        .map_err(|e| e.to_string())?;

    if !dry_run {
        let batch = MoveBatch::new(dest_root, report.moved.clone(), report.errors.clone());
        let mut ledger = history.0.lock().map_err(|e| e.to_string())?;
        ledger.record(batch);
    }

    Ok(MoveResponse {
        ok: report.errors.is_empty(),
        moved: report.moved,
        errors: report.errors,
    })
}
