//! Realtime refresh scheduler.
//!
//! Selects snapshot rows by arrival-time window, fans the lookups out to
//! the provider, and merges results back through the snapshot manager.
//! Row-level failures are counted, never propagated; a batch always runs
//! to completion.

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use common::{now_minutes, time_to_minutes, SnapshotEntry};

use realtime_client::{lookup_key, LookupProvider};

use crate::snapshot::{SnapshotManager, WriteOutcome};

/// Arrival-time window a refresh run selects candidates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshWindow {
    /// Rows arriving strictly after `now` and at most `lookahead`
    /// minutes ahead. Driven by the periodic timer.
    Upcoming { now: u32, lookahead: u32 },
    /// Rows scheduled at or before `now`. Triggered on demand.
    CatchUp { now: u32 },
    /// Every row with a parseable arrival time, processed in fixed-size
    /// batches to bound fan-out against the full table.
    All,
}

/// Per-run counters returned to the triggering caller.
///
/// Invariant: `updated + errors == total_selected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub total_selected: usize,
    /// Rows whose lookup succeeded. This bucket includes writes that
    /// were discarded because the originating snapshot was replaced or
    /// the row vanished from it; the provider is authoritative, so only
    /// lookup and merge faults count as errors.
    pub updated: usize,
    pub errors: usize,
}

pub struct RefreshScheduler {
    manager: Arc<SnapshotManager>,
    provider: Arc<dyn LookupProvider>,
    lookup_timeout: Duration,
    lookahead_mins: u32,
    bulk_batch_size: usize,
}

impl RefreshScheduler {
    pub fn new(
        manager: Arc<SnapshotManager>,
        provider: Arc<dyn LookupProvider>,
        lookup_timeout: Duration,
        lookahead_mins: u32,
        bulk_batch_size: usize,
    ) -> Self {
        Self {
            manager,
            provider,
            lookup_timeout,
            lookahead_mins,
            bulk_batch_size: bulk_batch_size.max(1),
        }
    }

    /// Periodic entry point: refresh rows arriving within the lookahead.
    pub async fn refresh_upcoming(&self) -> common::Result<RefreshReport> {
        self.refresh(RefreshWindow::Upcoming {
            now: now_minutes(),
            lookahead: self.lookahead_mins,
        })
        .await
    }

    /// On-demand entry point: refresh rows already due.
    pub async fn refresh_catch_up(&self) -> common::Result<RefreshReport> {
        self.refresh(RefreshWindow::CatchUp { now: now_minutes() })
            .await
    }

    /// On-demand entry point: refresh the whole table, batch by batch.
    pub async fn refresh_all(&self) -> common::Result<RefreshReport> {
        self.refresh(RefreshWindow::All).await
    }

    /// Core operation shared by all three call patterns.
    pub async fn refresh(&self, window: RefreshWindow) -> common::Result<RefreshReport> {
        let outcome = self.manager.ensure_fresh().await;
        if let Some(w) = outcome.warning {
            warn!("Refreshing against possibly stale snapshot: {}", w);
        }

        let generation = self.manager.generation().await;
        let rows = self.manager.read_rows().await?;
        let selected: Vec<SnapshotEntry> = rows
            .into_iter()
            .filter(|row| in_window(&row.schedule.scheduled_arrival, window))
            .collect();

        let batch_size = match window {
            // Windowed and catch-up populations are small by
            // construction; run them in one unbounded burst.
            RefreshWindow::Upcoming { .. } | RefreshWindow::CatchUp { .. } => {
                selected.len().max(1)
            }
            RefreshWindow::All => self.bulk_batch_size,
        };

        let mut report = RefreshReport {
            total_selected: selected.len(),
            ..Default::default()
        };

        for batch in selected.chunks(batch_size) {
            let mut in_flight: FuturesUnordered<_> = batch
                .iter()
                .map(|row| self.refresh_row(generation, row))
                .collect();
            while let Some(updated) = in_flight.next().await {
                if updated {
                    report.updated += 1;
                } else {
                    report.errors += 1;
                }
            }
        }

        info!(
            "Refresh {:?}: selected={} updated={} errors={}",
            window, report.total_selected, report.updated, report.errors
        );
        Ok(report)
    }

    /// One lookup-and-merge. Returns whether the row counts as updated;
    /// any provider, timeout, or store fault counts as a row error.
    async fn refresh_row(&self, generation: u64, row: &SnapshotEntry) -> bool {
        let key = lookup_key(&row.schedule.name, row.entity_id());

        let looked_up = tokio::time::timeout(self.lookup_timeout, self.provider.lookup(&key)).await;
        let enrichment = match looked_up {
            Err(_) => {
                warn!(
                    "Lookup for {} timed out after {:?}",
                    key, self.lookup_timeout
                );
                return false;
            }
            Ok(Err(e)) => {
                warn!("Lookup for {} failed: {}", key, e);
                return false;
            }
            Ok(Ok(enrichment)) => enrichment,
        };

        match self.manager.apply_enrichment(generation, row.entity_id(), &enrichment).await {
            Ok(WriteOutcome::Applied) => true,
            Ok(WriteOutcome::Stale) => {
                // Rollover won the race; the lookup itself succeeded.
                debug!("Discarding stale write for {}", key);
                true
            }
            Ok(WriteOutcome::Missing) => {
                debug!("Row for {} vanished from the snapshot", key);
                true
            }
            Err(e) => {
                warn!("Merge for {} failed: {}", key, e);
                false
            }
        }
    }
}

/// Window membership for one scheduled-arrival string. Sentinel and
/// malformed times parse to no value and are excluded from every
/// selection.
fn in_window(scheduled: &str, window: RefreshWindow) -> bool {
    let Some(mins) = time_to_minutes(scheduled) else {
        return false;
    };
    match window {
        RefreshWindow::Upcoming { now, lookahead } => mins > now && mins <= now + lookahead,
        RefreshWindow::CatchUp { now } => mins <= now,
        RefreshWindow::All => true,
    }
}
