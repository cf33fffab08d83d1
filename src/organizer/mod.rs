//! Move planning, execution, and undo for grouping photos by person.

pub mod executor;
pub mod planner;
pub mod undo;

pub use executor::{transfer_file, TransferError};
pub use planner::{execute_plan, sanitize_person, unique_destination, PlanError, PlanItem};
pub use undo::{undo_recent, RestoreStrategy, UndoReport};

use serde::{Deserialize, Serialize};

/// A completed file move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub from: String,
    pub to: String,
}

/// A per-item failure that did not stop the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    pub path: String,
    pub error: String,
}

/// Outcome of executing one plan: what moved and what failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    pub moved: Vec<MoveRecord>,
    pub errors: Vec<ItemError>,
}
