//! In-memory snapshot store.

use std::sync::Mutex;

use crate::error::Result;
use crate::models::Snapshot;
use crate::storage::SnapshotStore;

/// Snapshot store kept in process memory.
///
/// Used for dry runs and tests; state is lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            saves: Mutex::new(0),
        }
    }

    /// Number of completed `save` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Snapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = snapshot.clone();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
