//! In-memory store implementations.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;

use common::{DayTag, Enrichment, EntityId, Error, Result, ScheduleEntry, SnapshotEntry};

use crate::{MasterStore, SnapshotStore};

/// Master schedule held in memory, seeded from a JSON file at startup.
#[derive(Debug)]
pub struct MemoryMasterStore {
    rows: RwLock<Vec<ScheduleEntry>>,
}

impl MemoryMasterStore {
    pub fn from_rows(rows: Vec<ScheduleEntry>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Load a JSON array of [`ScheduleEntry`] rows.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::StoreUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        let rows: Vec<ScheduleEntry> = serde_json::from_str(&contents).map_err(|e| {
            Error::StoreUnavailable(format!("cannot parse {}: {}", path.display(), e))
        })?;
        debug!("Loaded {} schedule rows from {}", rows.len(), path.display());
        Ok(Self::from_rows(rows))
    }
}

#[async_trait]
impl MasterStore for MemoryMasterStore {
    async fn entries_for_day(&self, day: DayTag) -> Result<Vec<ScheduleEntry>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| r.active_days.contains(&day))
            .cloned()
            .collect())
    }
}

/// Snapshot collection held in memory. Replaced wholesale at rollover;
/// row insertion order is preserved so readers see stable tie ordering.
#[derive(Default)]
pub struct MemorySnapshotStore {
    rows: RwLock<Vec<SnapshotEntry>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn replace_all(&self, rows: Vec<SnapshotEntry>) -> Result<()> {
        *self.rows.write().await = rows;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<SnapshotEntry>> {
        Ok(self.rows.read().await.clone())
    }

    async fn apply_enrichment(&self, id: EntityId, enrichment: &Enrichment) -> Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|r| r.entity_id() == id) {
            Some(row) => {
                row.real_arrival = enrichment.real_arrival.clone();
                row.delay = enrichment.delay.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(id: EntityId, days: &[DayTag]) -> ScheduleEntry {
        ScheduleEntry {
            entity_id: id,
            name: format!("Test Express {}", id),
            category: "Express".into(),
            origin: "A".into(),
            destination: "B".into(),
            scheduled_arrival: "10:00".into(),
            platform: "1".into(),
            active_days: days.to_vec(),
            distance_km: 100,
            priority: None,
        }
    }

    #[tokio::test]
    async fn master_store_filters_by_day() {
        let store = MemoryMasterStore::from_rows(vec![
            entry(1, &[DayTag::Mon, DayTag::Wed]),
            entry(2, &[DayTag::Tue]),
            entry(3, &[DayTag::Mon]),
        ]);

        let mon = store.entries_for_day(DayTag::Mon).await.unwrap();
        assert_eq!(
            mon.iter().map(|r| r.entity_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(store.entries_for_day(DayTag::Sun).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_store_applies_enrichment_by_key() {
        let store = MemorySnapshotStore::new();
        store
            .replace_all(vec![
                SnapshotEntry::new(entry(1, &[DayTag::Mon])),
                SnapshotEntry::new(entry(2, &[DayTag::Mon])),
            ])
            .await
            .unwrap();

        let enrichment = Enrichment {
            real_arrival: Some("10:08".into()),
            delay: Some("Delayed by 8 mins".into()),
        };
        assert!(store.apply_enrichment(2, &enrichment).await.unwrap());
        assert!(!store.apply_enrichment(99, &enrichment).await.unwrap());

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows[0].real_arrival, None);
        assert_eq!(rows[1].real_arrival.as_deref(), Some("10:08"));
        assert_eq!(rows[1].delay.as_deref(), Some("Delayed by 8 mins"));
    }

    #[tokio::test]
    async fn master_store_loads_json_seed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{
                "entity_id": 12367,
                "name": "Vikramshila Express",
                "origin": "Anand Vihar",
                "destination": "Bhagalpur",
                "scheduled_arrival": "11:40",
                "platform": "2",
                "active_days": ["Mon", "Thu"],
                "distance_km": 1100
            }}]"#
        )
        .unwrap();

        let store = MemoryMasterStore::load(file.path()).unwrap();
        let rows = store.entries_for_day(DayTag::Thu).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Vikramshila Express");
    }

    #[test]
    fn master_store_load_reports_unreachable_file() {
        let err = MemoryMasterStore::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
