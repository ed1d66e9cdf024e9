//! Error types for POI analysis.

use thiserror::Error;

/// Errors surfaced by fetching, configuration and report output.
///
/// Deduplication and clustering never fail; malformed records are skipped
/// before they reach them.
#[derive(Error, Debug)]
pub enum PoiError {
    #[cfg(feature = "http")]
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("no geocoding result for {0:?}")]
    LocationNotFound(String),
}

pub type Result<T> = std::result::Result<T, PoiError>;
