//! Day snapshot manager.
//!
//! Owns the lifecycle of the day-scoped snapshot collection: rebuilds it
//! from the master schedule when the wall-clock weekday changes, and
//! guards enrichment writes so a batch racing a rollover cannot land
//! stale data on the new day's rows.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use common::{DayTag, Enrichment, EntityId, Result, SnapshotEntry};
use store::{MasterStore, SnapshotStore};

/// Result of a rollover check.
#[derive(Debug, Clone)]
pub struct RolloverOutcome {
    /// Whether the snapshot was rebuilt on this call.
    pub rebuilt: bool,
    /// Day tag the live snapshot is scoped to after the call.
    pub day: Option<DayTag>,
    /// Non-fatal fault: the rebuild was needed but could not run, and
    /// the previous snapshot is still being served.
    pub warning: Option<String>,
}

/// Outcome of one guarded enrichment write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The originating snapshot is no longer live; the write was
    /// silently discarded.
    Stale,
    /// No row with that key exists in the live snapshot.
    Missing,
}

struct LiveState {
    day: Option<DayTag>,
    /// Bumped on every successful rebuild. Writers carry the generation
    /// they selected rows under.
    generation: u64,
}

/// Exclusive owner of the live day snapshot. All reads and enrichment
/// writes go through the manager, never a raw store handle.
pub struct SnapshotManager {
    master: Arc<dyn MasterStore>,
    snapshots: Arc<dyn SnapshotStore>,
    state: RwLock<LiveState>,
}

impl SnapshotManager {
    pub fn new(master: Arc<dyn MasterStore>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            master,
            snapshots,
            state: RwLock::new(LiveState {
                day: None,
                generation: 0,
            }),
        }
    }

    /// Weekday tag derived from wall-clock time at call time.
    pub fn current_day_tag(&self) -> DayTag {
        DayTag::today()
    }

    /// Rebuild the snapshot if the live day tag differs from the current
    /// wall-clock weekday. Safe to call concurrently with readers and
    /// writers of the previous snapshot.
    pub async fn ensure_fresh(&self) -> RolloverOutcome {
        self.ensure_for_day(self.current_day_tag()).await
    }

    /// Rollover check against an explicit day tag.
    ///
    /// The new collection is built fully off to the side and installed
    /// with a single `replace_all`, so readers in flight complete against
    /// the previous snapshot, never a half-built one. A master-store
    /// fault keeps the previous snapshot live and is reported as a
    /// warning, not an error.
    pub async fn ensure_for_day(&self, day: DayTag) -> RolloverOutcome {
        {
            let state = self.state.read().await;
            if state.day == Some(day) {
                return RolloverOutcome {
                    rebuilt: false,
                    day: state.day,
                    warning: None,
                };
            }
        }

        let mut state = self.state.write().await;
        // Another caller may have rolled over while we waited.
        if state.day == Some(day) {
            return RolloverOutcome {
                rebuilt: false,
                day: state.day,
                warning: None,
            };
        }

        match self.rebuild(day).await {
            Ok(count) => {
                state.day = Some(day);
                state.generation += 1;
                info!("Snapshot rolled over to {}: {} rows", day, count);
                RolloverOutcome {
                    rebuilt: true,
                    day: Some(day),
                    warning: None,
                }
            }
            Err(e) => {
                warn!("Snapshot rollover to {} failed, serving previous: {}", day, e);
                RolloverOutcome {
                    rebuilt: false,
                    day: state.day,
                    warning: Some(e.to_string()),
                }
            }
        }
    }

    async fn rebuild(&self, day: DayTag) -> Result<usize> {
        let masters = self.master.entries_for_day(day).await?;
        let rows: Vec<SnapshotEntry> = masters.into_iter().map(SnapshotEntry::new).collect();
        let count = rows.len();
        self.snapshots.replace_all(rows).await?;
        Ok(count)
    }

    /// Generation of the live snapshot. Captured by refresh runs before
    /// selection so their writes can be checked for staleness.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Read-only view of the current snapshot, rollover check included.
    pub async fn rows(&self) -> Result<Vec<SnapshotEntry>> {
        let outcome = self.ensure_fresh().await;
        if let Some(w) = outcome.warning {
            warn!("Serving possibly stale snapshot: {}", w);
        }
        self.snapshots.read_all().await
    }

    /// Snapshot rows without triggering a rollover check. Used by
    /// refresh runs that have already called [`Self::ensure_fresh`].
    pub async fn read_rows(&self) -> Result<Vec<SnapshotEntry>> {
        self.snapshots.read_all().await
    }

    /// Write an enrichment pair onto the row with `id`, provided the
    /// snapshot the caller selected under is still live. Stale writes
    /// are discarded without touching the store.
    pub async fn apply_enrichment(
        &self,
        generation: u64,
        id: EntityId,
        enrichment: &Enrichment,
    ) -> Result<WriteOutcome> {
        {
            let state = self.state.read().await;
            if state.generation != generation {
                return Ok(WriteOutcome::Stale);
            }
        }
        if self.snapshots.apply_enrichment(id, enrichment).await? {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::Missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::{Error, ScheduleEntry};
    use std::sync::atomic::{AtomicBool, Ordering};
    use store::{MemoryMasterStore, MemorySnapshotStore};

    fn entry(id: EntityId, days: &[DayTag], arrival: &str) -> ScheduleEntry {
        ScheduleEntry {
            entity_id: id,
            name: format!("Train {}", id),
            category: "Express".into(),
            origin: "A".into(),
            destination: "B".into(),
            scheduled_arrival: arrival.into(),
            platform: "1".into(),
            active_days: days.to_vec(),
            distance_km: 0,
            priority: None,
        }
    }

    fn manager(rows: Vec<ScheduleEntry>) -> SnapshotManager {
        SnapshotManager::new(
            Arc::new(MemoryMasterStore::from_rows(rows)),
            Arc::new(MemorySnapshotStore::new()),
        )
    }

    #[tokio::test]
    async fn rollover_filters_master_by_day_and_resets_enrichment() {
        let mgr = manager(vec![
            entry(1, &[DayTag::Mon, DayTag::Fri], "10:00"),
            entry(2, &[DayTag::Tue], "11:00"),
            entry(3, &[DayTag::Fri], "12:00"),
        ]);

        let outcome = mgr.ensure_for_day(DayTag::Fri).await;
        assert!(outcome.rebuilt);
        assert_eq!(outcome.day, Some(DayTag::Fri));

        let rows = mgr.read_rows().await.unwrap();
        assert_eq!(
            rows.iter().map(|r| r.entity_id()).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(rows.iter().all(|r| r.real_arrival.is_none() && r.delay.is_none()));
    }

    #[tokio::test]
    async fn rollover_is_idempotent_within_a_day() {
        let mgr = manager(vec![entry(1, &[DayTag::Mon], "10:00")]);

        assert!(mgr.ensure_for_day(DayTag::Mon).await.rebuilt);
        let gen = mgr.generation().await;

        let again = mgr.ensure_for_day(DayTag::Mon).await;
        assert!(!again.rebuilt);
        assert_eq!(mgr.generation().await, gen);
    }

    #[tokio::test]
    async fn day_change_discards_old_enrichment() {
        let mgr = manager(vec![entry(1, &[DayTag::Mon, DayTag::Tue], "10:00")]);
        mgr.ensure_for_day(DayTag::Mon).await;

        let gen = mgr.generation().await;
        let e = Enrichment {
            real_arrival: Some("10:08".into()),
            delay: None,
        };
        assert_eq!(
            mgr.apply_enrichment(gen, 1, &e).await.unwrap(),
            WriteOutcome::Applied
        );

        mgr.ensure_for_day(DayTag::Tue).await;
        let rows = mgr.read_rows().await.unwrap();
        assert!(rows[0].real_arrival.is_none());
    }

    #[tokio::test]
    async fn stale_generation_write_is_a_no_op() {
        let mgr = manager(vec![entry(1, &[DayTag::Mon, DayTag::Tue], "10:00")]);
        mgr.ensure_for_day(DayTag::Mon).await;
        let old_gen = mgr.generation().await;

        mgr.ensure_for_day(DayTag::Tue).await;

        let e = Enrichment {
            real_arrival: Some("10:08".into()),
            delay: None,
        };
        assert_eq!(
            mgr.apply_enrichment(old_gen, 1, &e).await.unwrap(),
            WriteOutcome::Stale
        );
        let rows = mgr.read_rows().await.unwrap();
        assert!(rows[0].real_arrival.is_none());
    }

    #[tokio::test]
    async fn write_to_unknown_row_reports_missing() {
        let mgr = manager(vec![entry(1, &[DayTag::Mon], "10:00")]);
        mgr.ensure_for_day(DayTag::Mon).await;
        let gen = mgr.generation().await;

        let e = Enrichment {
            real_arrival: None,
            delay: Some("Right Time".into()),
        };
        assert_eq!(
            mgr.apply_enrichment(gen, 42, &e).await.unwrap(),
            WriteOutcome::Missing
        );
    }

    /// Master store that fails once poisoned.
    struct FlakyMaster {
        inner: MemoryMasterStore,
        poisoned: AtomicBool,
    }

    #[async_trait]
    impl MasterStore for FlakyMaster {
        async fn entries_for_day(&self, day: DayTag) -> Result<Vec<ScheduleEntry>> {
            if self.poisoned.load(Ordering::SeqCst) {
                return Err(Error::StoreUnavailable("master offline".into()));
            }
            self.inner.entries_for_day(day).await
        }
    }

    #[tokio::test]
    async fn failed_rollover_keeps_previous_snapshot_and_warns() {
        let master = Arc::new(FlakyMaster {
            inner: MemoryMasterStore::from_rows(vec![entry(
                1,
                &[DayTag::Mon, DayTag::Tue],
                "10:00",
            )]),
            poisoned: AtomicBool::new(false),
        });
        let mgr = SnapshotManager::new(master.clone(), Arc::new(MemorySnapshotStore::new()));

        assert!(mgr.ensure_for_day(DayTag::Mon).await.rebuilt);
        master.poisoned.store(true, Ordering::SeqCst);

        let outcome = mgr.ensure_for_day(DayTag::Tue).await;
        assert!(!outcome.rebuilt);
        assert_eq!(outcome.day, Some(DayTag::Mon));
        assert!(outcome.warning.is_some());

        // The previous day's rows are still served.
        let rows = mgr.read_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
