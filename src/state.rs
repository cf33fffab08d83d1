//! Managed state shared across command invocations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::history::MoveLedger;
use crate::metadata::MetadataSource;
use crate::thumbs::ThumbnailCache;

/// The move ledger behind its command-boundary lock.
///
/// The mutex is held for the whole of an undo call, so recording and
/// undoing can never interleave on the same ledger.
pub struct HistoryState(pub Arc<Mutex<MoveLedger>>);

impl HistoryState {
    pub fn new(ledger: MoveLedger) -> Self {
        Self(Arc::new(Mutex::new(ledger)))
    }
}

/// The metadata backend picked at startup.
pub struct MetadataState(pub Arc<dyn MetadataSource>);

/// The thumbnail cache opened at startup.
pub struct ThumbnailState(pub Arc<ThumbnailCache>);

/// Issues scan ids and routes cancellation requests to running scans.
#[derive(Clone, Default)]
pub struct ScanRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    active: Mutex<HashMap<u64, Arc<AtomicBool>>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new scan, returning its id and cancel flag.
    pub fn register(&self) -> (u64, Arc<AtomicBool>) {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let flag = Arc::new(AtomicBool::new(false));
        if let Ok(mut active) = self.inner.active.lock() {
            active.insert(id, flag.clone());
        }
        (id, flag)
    }

    /// Requests cancellation. Returns false for ids that are unknown or
    /// already finished.
    pub fn cancel(&self, id: u64) -> bool {
        match self.inner.active.lock() {
            Ok(active) => match active.get(&id) {
                Some(flag) => {
                    flag.store(true, Ordering::Relaxed);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Drops the bookkeeping for a finished scan.
    pub fn finish(&self, id: u64) {
        if let Ok(mut active) = self.inner.active.lock() {
            active.remove(&id);
        }
    }
}
