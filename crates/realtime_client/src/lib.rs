//! External provider adapters.
//!
//! The refresh scheduler and weather cache only ever see these traits;
//! the reference transport (a Python script spawned per call) lives in
//! [`script`], and any other out-of-process model can be slotted in
//! behind the same contract.

pub mod parse;
pub mod script;

use async_trait::async_trait;
use common::{Enrichment, Result, WeatherSample};

pub use script::{ScriptLookupProvider, ScriptWeatherProvider};

/// Per-entity real-time status provider.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Look up real-time data for one lookup key
    /// (`"{normalized-name}-{entity_id}"`).
    async fn lookup(&self, key: &str) -> Result<Enrichment>;
}

/// Station-wide weather provider.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self) -> Result<WeatherSample>;
}

/// Build the opaque lookup key for a schedule row: display name
/// lower-cased with whitespace runs collapsed to `-`, then the id.
pub fn lookup_key(name: &str, entity_id: common::EntityId) -> String {
    let normalized = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{}-{}", normalized, entity_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_key_normalizes_display_names() {
        assert_eq!(
            lookup_key("Vikramshila  Express", 12367),
            "vikramshila-express-12367"
        );
        assert_eq!(lookup_key("Rajdhani", 12309), "rajdhani-12309");
        assert_eq!(lookup_key("", 7), "-7");
    }
}
