//! Read-only projections over the live snapshot.

use chrono::{Local, Timelike};
use serde::Serialize;
use std::sync::Arc;

use common::{now_minutes, time_to_minutes, DelayState, EntityId, Result, SnapshotEntry, NO_PLATFORM};

use crate::snapshot::SnapshotManager;
use crate::status::derive_status;

/// Half-width of the arrivals-board window, in minutes around now.
const BOARD_WINDOW_MINS: u32 = 240;

/// One row on the arrivals board, status derived at read time.
#[derive(Debug, Clone, Serialize)]
pub struct BoardRow {
    pub id: EntityId,
    pub name: String,
    pub category: String,
    pub origin: String,
    pub destination: String,
    pub scheduled: String,
    /// Real arrival when known, scheduled otherwise.
    pub estimated: String,
    pub status: String,
    pub platform: String,
    pub delay: Option<String>,
    pub real_arrival: Option<String>,
    pub distance_km: u32,
    pub priority: Option<String>,
}

impl BoardRow {
    fn from_entry(row: &SnapshotEntry) -> Self {
        let s = &row.schedule;
        Self {
            id: s.entity_id,
            name: s.name.clone(),
            category: s.category.clone(),
            origin: s.origin.clone(),
            destination: s.destination.clone(),
            scheduled: s.scheduled_arrival.clone(),
            estimated: row
                .real_arrival
                .clone()
                .unwrap_or_else(|| s.scheduled_arrival.clone()),
            status: derive_status(
                &s.scheduled_arrival,
                row.real_arrival.as_deref(),
                row.delay.as_deref(),
            ),
            platform: s.platform.clone(),
            delay: row.delay.clone(),
            real_arrival: row.real_arrival.clone(),
            distance_km: s.distance_km,
            priority: s.priority.clone(),
        }
    }
}

/// The arrivals board plus its reference time.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub rows: Vec<BoardRow>,
    pub current_time: String,
    pub total: usize,
}

/// Aggregate statistics over the whole snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BoardStats {
    pub total: usize,
    /// Rows within the board window around now.
    pub in_window: usize,
    pub on_time: usize,
    pub delayed: usize,
    /// Share of rows with an allocated platform, in percent.
    pub platform_utilization_pct: u32,
    /// Mean of the reported delay minute counts.
    pub average_delay_mins: u32,
}

/// Read-only query surface for downstream consumers.
pub struct QueryFacade {
    manager: Arc<SnapshotManager>,
}

impl QueryFacade {
    pub fn new(manager: Arc<SnapshotManager>) -> Self {
        Self { manager }
    }

    /// Arrivals within ±4 hours of now, ascending by scheduled arrival.
    pub async fn arrivals_board(&self) -> Result<BoardView> {
        let rows = self.manager.rows().await?;
        let now = Local::now();
        let board = board_rows(&rows, now.hour() * 60 + now.minute());
        Ok(BoardView {
            total: board.len(),
            rows: board,
            current_time: now.format("%H:%M").to_string(),
        })
    }

    /// Single row by train number, with derived status.
    pub async fn entry(&self, id: EntityId) -> Result<Option<BoardRow>> {
        let rows = self.manager.rows().await?;
        Ok(rows
            .iter()
            .find(|r| r.entity_id() == id)
            .map(BoardRow::from_entry))
    }

    /// Rows that carry any real-time data.
    pub async fn enriched_rows(&self) -> Result<Vec<BoardRow>> {
        let rows = self.manager.rows().await?;
        Ok(rows
            .iter()
            .filter(|r| r.is_enriched())
            .map(BoardRow::from_entry)
            .collect())
    }

    /// Aggregate stats for dashboards.
    pub async fn stats(&self) -> Result<BoardStats> {
        let rows = self.manager.rows().await?;
        Ok(compute_stats(&rows, now_minutes()))
    }
}

/// Pure board projection: window filter, stable sort by scheduled
/// arrival (ties keep collection order), status derived per row.
pub fn board_rows(rows: &[SnapshotEntry], now: u32) -> Vec<BoardRow> {
    let mut board: Vec<(u32, BoardRow)> = rows
        .iter()
        .filter_map(|row| {
            let mins = time_to_minutes(&row.schedule.scheduled_arrival)?;
            let distance = (mins as i64 - now as i64).unsigned_abs() as u32;
            (distance <= BOARD_WINDOW_MINS).then(|| (mins, BoardRow::from_entry(row)))
        })
        .collect();
    board.sort_by_key(|(mins, _)| *mins);
    board.into_iter().map(|(_, row)| row).collect()
}

/// Pure stats aggregation over the full snapshot.
pub fn compute_stats(rows: &[SnapshotEntry], now: u32) -> BoardStats {
    let total = rows.len();
    let in_window = rows
        .iter()
        .filter_map(|r| time_to_minutes(&r.schedule.scheduled_arrival))
        .filter(|m| (*m as i64 - now as i64).unsigned_abs() as u32 <= BOARD_WINDOW_MINS)
        .count();

    let mut on_time = 0usize;
    let mut delayed = 0usize;
    let mut delay_sum = 0u64;
    let mut delay_count = 0u64;
    for row in rows {
        match row.delay.as_deref().map(DelayState::from_descriptor) {
            Some(DelayState::Delayed(mins)) => {
                delayed += 1;
                if let Some(m) = mins {
                    delay_sum += u64::from(m);
                    delay_count += 1;
                }
            }
            // No descriptor yet, "Right Time", or unrecognized all count
            // as on time for dashboard purposes.
            _ => on_time += 1,
        }
    }

    let with_platform = rows
        .iter()
        .filter(|r| r.schedule.platform != NO_PLATFORM && !r.schedule.platform.is_empty())
        .count();

    BoardStats {
        total,
        in_window,
        on_time,
        delayed,
        platform_utilization_pct: percentage(with_platform, total),
        average_delay_mins: if delay_count > 0 {
            (delay_sum as f64 / delay_count as f64).round() as u32
        } else {
            0
        },
    }
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}
