//! Error types for the health-check engine.
//!
//! Failures local to one endpoint never show up here: they are folded into a
//! [`ProbeOutcome`](crate::ProbeOutcome). Only structural failures that stop a
//! whole cycle are reported as errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The endpoint list could not be produced
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read endpoint file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse endpoint file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Endpoint at position {0} has an empty id")]
    EmptyId(usize),
    #[error("Duplicate endpoint id: {0}")]
    DuplicateId(String),
    #[error("Invalid URL for endpoint {id}: {reason}")]
    InvalidUrl { id: String, reason: String },
}

/// A cycle could not produce a complete report
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Endpoint registry unavailable: {0}")]
    Registry(#[from] RegistryError),
    #[error("Probe worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    #[error("Cycle cancelled before all probes resolved")]
    Cancelled,
}

/// Engine settings rejected during validation
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Probe timeout too short: {0:?} (minimum: {1:?})")]
    TimeoutTooShort(Duration, Duration),
    #[error("Probe timeout too long: {0:?} (maximum: {1:?})")]
    TimeoutTooLong(Duration, Duration),
    #[error("Enrichment timeout must be greater than zero")]
    ZeroEnrichTimeout,
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
