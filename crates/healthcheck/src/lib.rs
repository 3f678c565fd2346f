//! Health-check aggregation engine for Uppe status pages.
//!
//! One call to [`HealthEngine::run_cycle`] is one cycle: the registry is read,
//! every endpoint is probed concurrently under a bounded timeout, each outcome
//! is classified into a tri-state status, optional enrichment is attached and
//! the results are rolled up into a single [`SystemHealthReport`].

pub mod aggregator;
pub mod classifier;
pub mod endpoint;
pub mod engine;
pub mod enricher;
pub mod error;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod status;
pub mod validation;

// Re-export main types
pub use aggregator::{EndpointHealth, ServerEntry, Summary, SystemHealthReport, aggregate};
pub use classifier::classify;
pub use endpoint::Endpoint;
pub use engine::HealthEngine;
pub use enricher::{Enrichment, MetricsEnricher, StatusHistoryEnricher};
pub use error::{CycleError, RegistryError, SettingsError};
pub use probe::{FailureReason, HttpProber, ProbeOutcome, Prober};
pub use registry::{EndpointRegistry, FileRegistry, StaticRegistry};
pub use scheduler::{ProbeRecord, ProbeScheduler};
pub use settings::{EngineSettings, ProbeMethod};
pub use status::{EndpointStatus, SystemStatus};

/// Default per-probe timeout used when nothing else is configured
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// Default upper bound for a single enrichment call
pub const DEFAULT_ENRICH_TIMEOUT_MS: u64 = 2_000;
