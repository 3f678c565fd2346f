//! Supplementary per-endpoint metrics.
//!
//! The engine calls a [`MetricsEnricher`] once per endpoint per cycle, after
//! the endpoint's status is final. Enrichment is best effort: a slow,
//! failing or panicking enricher yields [`Enrichment::unknown`] for that
//! endpoint and nothing else changes.

mod history;

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::warn;

pub use history::StatusHistoryEnricher;

use crate::endpoint::Endpoint;
use crate::scheduler::ProbeRecord;
use crate::status::EndpointStatus;

/// Placeholder text for values an enricher could not supply
pub const UNKNOWN: &str = "unknown";

/// Certificate summary for an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslInfo {
    pub is_valid: Option<bool>,
    pub expires_in: String,
}

/// Availability percentages over fixed windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(rename = "last24h")]
    pub last_24h: String,
    #[serde(rename = "last7d")]
    pub last_7d: String,
}

/// Descriptive data merged into an endpoint's report entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    pub ssl_info: SslInfo,
    pub availability: Availability,
    pub last_downtime: String,
    pub response_history: Vec<u64>,
}

impl Enrichment {
    /// The placeholder substituted whenever enrichment fails
    pub fn unknown() -> Self {
        Self {
            ssl_info: SslInfo { is_valid: None, expires_in: UNKNOWN.to_string() },
            availability: Availability {
                last_24h: UNKNOWN.to_string(),
                last_7d: UNKNOWN.to_string(),
            },
            last_downtime: UNKNOWN.to_string(),
            response_history: Vec::new(),
        }
    }
}

/// Supplies supplementary data for an endpoint with a finalized status
#[async_trait::async_trait]
pub trait MetricsEnricher: Send + Sync {
    async fn enrich(&self, endpoint: &Endpoint, status: EndpointStatus) -> anyhow::Result<Enrichment>;
}

/// Enrich every record concurrently, one call per endpoint
///
/// The returned vector is aligned with `records`.
pub(crate) async fn enrich_all(
    enricher: &dyn MetricsEnricher,
    records: &[ProbeRecord],
    deadline: Duration,
) -> Vec<Enrichment> {
    let calls = records.iter().map(|record| enrich_one(enricher, record, deadline));
    join_all(calls).await
}

async fn enrich_one(enricher: &dyn MetricsEnricher, record: &ProbeRecord, deadline: Duration) -> Enrichment {
    let call = AssertUnwindSafe(enricher.enrich(&record.endpoint, record.status)).catch_unwind();

    match timeout(deadline, call).await {
        Ok(Ok(Ok(enrichment))) => enrichment,
        Ok(Ok(Err(e))) => {
            warn!(endpoint = %record.endpoint.id, "Enrichment failed: {e:#}");
            Enrichment::unknown()
        }
        Ok(Err(_)) => {
            warn!(endpoint = %record.endpoint.id, "Enrichment panicked");
            Enrichment::unknown()
        }
        Err(_) => {
            warn!(endpoint = %record.endpoint.id, "Enrichment timed out after {deadline:?}");
            Enrichment::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOutcome;
    use anyhow::anyhow;
    use chrono::Utc;

    struct FixedEnricher;

    #[async_trait::async_trait]
    impl MetricsEnricher for FixedEnricher {
        async fn enrich(&self, endpoint: &Endpoint, status: EndpointStatus) -> anyhow::Result<Enrichment> {
            match endpoint.id.as_str() {
                "fails" => Err(anyhow!("metrics store unreachable")),
                "panics" => panic!("enricher bug"),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Enrichment::unknown())
                }
                _ => {
                    let mut enrichment = Enrichment::unknown();
                    enrichment.last_downtime = status.to_string();
                    enrichment.response_history = vec![1, 2, 3];
                    Ok(enrichment)
                }
            }
        }
    }

    fn record(id: &str) -> ProbeRecord {
        ProbeRecord {
            endpoint: Endpoint::new(id, id, format!("http://{id}.test")),
            outcome: ProbeOutcome::responded(200, 10),
            status: EndpointStatus::Online,
            response_time_millis: 10,
            checked_at: Utc::now(),
        }
    }

    #[test]
    fn test_unknown_placeholder_serialization() {
        let json = serde_json::to_value(Enrichment::unknown()).unwrap();

        assert!(json["sslInfo"]["isValid"].is_null());
        assert_eq!(json["sslInfo"]["expiresIn"], "unknown");
        assert_eq!(json["availability"]["last24h"], "unknown");
        assert_eq!(json["availability"]["last7d"], "unknown");
        assert_eq!(json["lastDowntime"], "unknown");
        assert_eq!(json["responseHistory"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_failures_are_replaced_with_placeholder() {
        let records = vec![record("ok"), record("fails"), record("panics"), record("slow")];

        let enrichments = enrich_all(&FixedEnricher, &records, Duration::from_millis(100)).await;

        assert_eq!(enrichments.len(), 4);
        assert_eq!(enrichments[0].last_downtime, "online");
        assert_eq!(enrichments[0].response_history, vec![1, 2, 3]);
        for enrichment in &enrichments[1..] {
            assert_eq!(enrichment, &Enrichment::unknown());
        }
    }
}
