//! Storage contracts for the schedule master table and the day snapshot.
//!
//! The relational engine behind these traits is assumed to exist already;
//! this crate only defines the key-addressed read/write surface the board
//! needs, plus in-memory implementations used by the daemon and tests.

pub mod memory;

use async_trait::async_trait;
use common::{DayTag, Enrichment, EntityId, Result, ScheduleEntry, SnapshotEntry};

pub use memory::{MemoryMasterStore, MemorySnapshotStore};

/// Read-only master schedule collection.
#[async_trait]
pub trait MasterStore: Send + Sync {
    /// All schedule lines whose `active_days` contains `day`.
    async fn entries_for_day(&self, day: DayTag) -> Result<Vec<ScheduleEntry>>;
}

/// The day-scoped snapshot collection: created in bulk at rollover,
/// mutated row-by-row by the refresh scheduler, read by projections.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Create-or-replace the whole collection.
    async fn replace_all(&self, rows: Vec<SnapshotEntry>) -> Result<()>;

    async fn read_all(&self) -> Result<Vec<SnapshotEntry>>;

    /// Write both enrichment fields onto the row with `id`.
    ///
    /// Returns `false` when no such row exists in the collection.
    async fn apply_enrichment(&self, id: EntityId, enrichment: &Enrichment) -> Result<bool>;
}
