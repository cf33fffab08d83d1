//! In-memory ledger of executed move batches.
//!
//! The ledger is the undo source of truth. It lives only in memory;
//! restarting the app forfeits undo.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::organizer::{ItemError, MoveRecord};

/// How many batches the ledger keeps before evicting the oldest.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One executed move batch, stamped at recording time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBatch {
    pub id: Uuid,
    pub executed_at: DateTime<Utc>,
    pub dest_root: String,
    pub moved: Vec<MoveRecord>,
    pub errors: Vec<ItemError>,
}

impl MoveBatch {
    pub fn new(dest_root: String, moved: Vec<MoveRecord>, errors: Vec<ItemError>) -> Self {
        Self {
            id: Uuid::new_v4(),
            executed_at: Utc::now(),
            dest_root,
            moved,
            errors,
        }
    }
}

/// Bounded queue of move batches, newest at the back.
pub struct MoveLedger {
    batches: VecDeque<MoveBatch>,
    capacity: usize,
}

impl MoveLedger {
    /// Creates a ledger holding at most `capacity` batches. A capacity
    /// below one is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            batches: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records a batch. Batches with no successful move are dropped,
    /// undoing them would do nothing. At capacity the oldest batch is
    /// evicted and its undo is gone for good.
    pub fn record(&mut self, batch: MoveBatch) -> bool {
        if batch.moved.is_empty() {
            tracing::debug!(id = %batch.id, "Not recording batch without successful moves");
            return false;
        }
        while self.batches.len() >= self.capacity {
            if let Some(evicted) = self.batches.pop_front() {
                tracing::debug!(id = %evicted.id, "History capacity reached, evicting oldest batch");
            }
        }
        tracing::info!(id = %batch.id, moved = batch.moved.len(), "Recorded move batch");
        self.batches.push_back(batch);
        true
    }

    /// Removes and returns the most recent batch.
    pub fn pop_latest(&mut self) -> Option<MoveBatch> {
        self.batches.pop_back()
    }

    /// The most recent batch, if any.
    pub fn latest(&self) -> Option<&MoveBatch> {
        self.batches.back()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MoveLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(tag: &str) -> MoveBatch {
        MoveBatch::new(
            "/dest".to_string(),
            vec![MoveRecord {
                from: format!("/src/{tag}"),
                to: format!("/dest/{tag}"),
            }],
            Vec::new(),
        )
    }

    #[test]
    fn records_and_pops_newest_first() {
        let mut ledger = MoveLedger::new(5);
        assert!(ledger.record(batch("a")));
        assert!(ledger.record(batch("b")));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pop_latest().unwrap().moved[0].from, "/src/b");
        assert_eq!(ledger.pop_latest().unwrap().moved[0].from, "/src/a");
        assert!(ledger.pop_latest().is_none());
    }

    #[test]
    fn rejects_batches_without_moves() {
        let mut ledger = MoveLedger::default();
        let empty = MoveBatch::new("/dest".to_string(), Vec::new(), Vec::new());

        assert!(!ledger.record(empty));
        assert!(ledger.is_empty());
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut ledger = MoveLedger::new(2);
        ledger.record(batch("a"));
        ledger.record(batch("b"));
        ledger.record(batch("c"));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pop_latest().unwrap().moved[0].from, "/src/c");
        assert_eq!(ledger.pop_latest().unwrap().moved[0].from, "/src/b");
    }

    #[test]
    fn default_capacity_holds_twenty_batches() {
        let mut ledger = MoveLedger::default();
        for i in 0..25 {
            ledger.record(batch(&i.to_string()));
        }

        assert_eq!(ledger.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(ledger.latest().unwrap().moved[0].from, "/src/24");
    }
}
