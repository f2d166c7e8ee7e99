//! Unified error type for station-board.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Provider failure: {0}")]
    Provider(String),

    #[error("Provider timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Malformed provider output: {0}")]
    MalformedOutput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
