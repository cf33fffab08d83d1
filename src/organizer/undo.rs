//! Multi-batch undo against the move ledger.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::executor::transfer_file;
use super::planner::unique_destination;
use super::{ItemError, MoveRecord};
use crate::history::MoveLedger;

/// What to do when a restore target is already occupied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreStrategy {
    /// Probe for a numbered sibling next to the original path.
    #[default]
    Unique,
    /// Leave the file where it is and report an error.
    Skip,
}

/// Outcome of an undo call across one or more batches.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoReport {
    pub undone: Vec<MoveRecord>,
    pub errors: Vec<ItemError>,
    pub undone_batches: usize,
}

/// Undoes up to `count` most recent batches, newest first.
///
/// Within a batch, records are restored in reverse execution order. A
/// popped batch is consumed whether or not every record restores; undo
/// is not transactional. An empty ledger undoes zero batches, which is
/// not an error. The caller holds the ledger for the whole call, so no
/// new batch can be recorded mid-undo.
pub fn undo_recent(ledger: &mut MoveLedger, count: usize, strategy: RestoreStrategy) -> UndoReport {
    let mut report = UndoReport::default();

    for _ in 0..count {
        let Some(batch) = ledger.pop_latest() else {
            break;
        };
        tracing::info!(id = %batch.id, moved = batch.moved.len(), "Undoing move batch");
        report.undone_batches += 1;

        for record in batch.moved.iter().rev() {
            let moved_to = Path::new(&record.to);
            if !moved_to.is_file() {
                report.errors.push(ItemError {
                    path: record.to.clone(),
                    error: "moved file no longer exists".to_string(),
                });
                continue;
            }

            let original = PathBuf::from(&record.from);
            let restore_to = if original.exists() {
                match strategy {
                    RestoreStrategy::Unique => unique_destination(&original),
                    RestoreStrategy::Skip => {
                        report.errors.push(ItemError {
                            path: record.to.clone(),
                            error: format!("restore target already exists: {}", record.from),
                        });
                        continue;
                    }
                }
            } else {
                original
            };

            match transfer_file(moved_to, &restore_to) {
                Ok(()) => report.undone.push(MoveRecord {
                    from: record.to.clone(),
                    to: restore_to.display().to_string(),
                }),
                Err(err) => report.errors.push(ItemError {
                    path: record.to.clone(),
                    error: err.to_string(),
                }),
            }
        }
    }

    tracing::info!(
        batches = report.undone_batches,
        restored = report.undone.len(),
        errors = report.errors.len(),
        "Undo finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::history::MoveBatch;
    use crate::organizer::planner::{execute_plan, PlanItem};

    fn plan(path: &Path, person: &str) -> PlanItem {
        PlanItem {
            path: path.display().to_string(),
            person: person.to_string(),
        }
    }

    fn run_batch(ledger: &mut MoveLedger, items: &[PlanItem], dest: &Path) {
        let report = execute_plan(items, dest, false).unwrap();
        ledger.record(MoveBatch::new(
            dest.display().to_string(),
            report.moved,
            report.errors,
        ));
    }

    #[test]
    fn restores_a_batch_to_original_paths() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let mut ledger = MoveLedger::default();
        run_batch(&mut ledger, &[plan(&a, "Alice"), plan(&b, "Bob")], &dest);
        assert!(!a.exists());

        let report = undo_recent(&mut ledger, 1, RestoreStrategy::Unique);

        assert_eq!(report.undone_batches, 1);
        assert_eq!(report.undone.len(), 2);
        assert!(report.errors.is_empty());
        assert!(a.is_file());
        assert!(b.is_file());
        assert!(!dest.join("Alice").join("a.jpg").exists());
        assert!(ledger.is_empty());
    }

    #[test]
    fn restores_within_a_batch_in_reverse_order() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let mut ledger = MoveLedger::default();
        run_batch(&mut ledger, &[plan(&a, "Alice"), plan(&b, "Bob")], &dest);

        let report = undo_recent(&mut ledger, 1, RestoreStrategy::Unique);

        assert_eq!(report.undone[0].to, b.display().to_string());
        assert_eq!(report.undone[1].to, a.display().to_string());
    }

    #[test]
    fn undoes_batches_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        let photo = dir.path().join("photo.jpg");
        fs::write(&photo, b"first").unwrap();

        let mut ledger = MoveLedger::default();
        run_batch(&mut ledger, &[plan(&photo, "Alice")], &dest);

        // A new file takes over the original path before the second batch.
        fs::write(&photo, b"second").unwrap();
        run_batch(&mut ledger, &[plan(&photo, "Bob")], &dest);

        let report = undo_recent(&mut ledger, 2, RestoreStrategy::Unique);

        assert_eq!(report.undone_batches, 2);
        assert!(report.errors.is_empty());
        // The newer batch restored first and won the original name.
        assert_eq!(fs::read(&photo).unwrap(), b"second");
        assert_eq!(fs::read(dir.path().join("photo (1).jpg")).unwrap(), b"first");
    }

    #[test]
    fn skip_strategy_leaves_occupied_targets_alone() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        let photo = dir.path().join("photo.jpg");
        fs::write(&photo, b"moved").unwrap();

        let mut ledger = MoveLedger::default();
        run_batch(&mut ledger, &[plan(&photo, "Alice")], &dest);
        fs::write(&photo, b"squatter").unwrap();

        let report = undo_recent(&mut ledger, 1, RestoreStrategy::Skip);

        assert_eq!(report.undone_batches, 1);
        assert!(report.undone.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(fs::read(&photo).unwrap(), b"squatter");
        assert!(dest.join("Alice").join("photo.jpg").is_file());
        assert!(ledger.is_empty());
    }

    #[test]
    fn missing_moved_file_is_an_error_for_that_record_only() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let mut ledger = MoveLedger::default();
        run_batch(&mut ledger, &[plan(&a, "Alice"), plan(&b, "Alice")], &dest);
        fs::remove_file(dest.join("Alice").join("a.jpg")).unwrap();

        let report = undo_recent(&mut ledger, 1, RestoreStrategy::Unique);

        assert_eq!(report.undone.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert!(b.is_file());
        assert!(!a.exists());
    }

    #[test]
    fn empty_ledger_is_a_no_op() {
        let mut ledger = MoveLedger::default();
        let report = undo_recent(&mut ledger, 3, RestoreStrategy::Unique);

        assert_eq!(report.undone_batches, 0);
        assert!(report.undone.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn count_beyond_ledger_depth_stops_at_the_bottom() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        let a = dir.path().join("a.jpg");
        fs::write(&a, b"a").unwrap();

        let mut ledger = MoveLedger::default();
        run_batch(&mut ledger, &[plan(&a, "Alice")], &dest);

        let report = undo_recent(&mut ledger, 10, RestoreStrategy::Unique);

        assert_eq!(report.undone_batches, 1);
        assert!(a.is_file());
    }
}
