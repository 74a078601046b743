//! Storage abstractions for snapshot persistence.
//!
//! The store holds exactly one document: the last observed [`Snapshot`].
//! It is always replaced wholesale; there is no merge.
//!
//! ```text
//! storage/
//! ├── config.toml           # Watcher configuration
//! └── grades.json           # Last snapshot { course_code: course, ... }
//! ```

pub mod local;
pub mod memory;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStore;

/// Trait for snapshot storage backends.
///
/// A single writer is assumed; callers serialize check cycles.
pub trait SnapshotStore: Send + Sync {
    /// Load the last persisted snapshot.
    ///
    /// Missing or unreadable state yields an empty snapshot.
    fn load(&self) -> Snapshot;

    /// Persist `snapshot`, fully replacing prior state.
    ///
    /// Readers never observe a partially written snapshot.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}
