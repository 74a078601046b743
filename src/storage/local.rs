//! Local filesystem storage implementation.
//!
//! Keeps the last snapshot as one pretty-printed JSON document. Writes go to
//! a sibling temp file that is renamed over the target, so a reader sees
//! either the old document or the new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStore;

/// Local filesystem snapshot store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a store backed by the given JSON file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the store and write an empty document if none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self::new(path);
        if !storage.path.exists() {
            log::info!("Creating empty snapshot at {}", storage.path.display());
            storage.save(&Snapshot::new())?;
        }
        Ok(storage)
    }

    /// Path of the snapshot document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir()?;

        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read and decode the document, surfacing every failure.
    fn try_load(&self) -> Result<Option<Snapshot>> {
        match self.read_bytes()? {
            Some(bytes) => {
                let mut snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                snapshot.normalize_codes();
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}

impl SnapshotStore for LocalStorage {
    fn load(&self) -> Snapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log::warn!("No snapshot found at {}", self.path.display());
                Snapshot::new()
            }
            Err(e) => {
                log::warn!(
                    "Unreadable snapshot at {} ({}). Starting from empty state.",
                    self.path.display(),
                    e
                );
                Snapshot::new()
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_bytes(&bytes)?;
        log::debug!(
            "Saved {} courses to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }
}
