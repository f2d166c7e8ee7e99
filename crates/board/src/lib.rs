//! Core of the station board.
//!
//! Owns the day-scoped snapshot, keeps it enriched with near-real-time
//! data from the lookup provider, and exposes read-only projections.

pub mod query;
pub mod refresh;
pub mod snapshot;
pub mod status;
pub mod weather;

pub use query::{BoardRow, BoardStats, BoardView, QueryFacade};
pub use refresh::{RefreshReport, RefreshScheduler, RefreshWindow};
pub use snapshot::{RolloverOutcome, SnapshotManager, WriteOutcome};
pub use status::derive_status;
pub use weather::{WeatherCache, WeatherReport};
