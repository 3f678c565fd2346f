//! Reachability probes.
//!
//! A probe performs exactly one timed request against one endpoint and never
//! fails: transport problems and deadlines are reported through the
//! [`ProbeOutcome`] it returns.

mod http;
mod outcome;

use std::time::Duration;

pub use http::HttpProber;
pub use outcome::{FailureReason, ProbeOutcome};

use crate::endpoint::Endpoint;

/// A single timed reachability check
///
/// Implementations must resolve within `timeout`; the scheduler enforces the
/// same deadline on top and synthesizes a timeout outcome for probes that
/// overrun it.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe `endpoint` once, giving up after `timeout`
    async fn probe(&self, endpoint: &Endpoint, timeout: Duration) -> ProbeOutcome;
}
