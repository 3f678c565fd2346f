//! Rollup of per-endpoint results into one system health report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enricher::Enrichment;
use crate::scheduler::ProbeRecord;
use crate::status::{EndpointStatus, SystemStatus};

/// Per-endpoint judgment for one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHealth {
    #[serde(rename = "id")]
    pub endpoint_id: String,

    pub status: EndpointStatus,

    /// 0 when offline
    #[serde(rename = "responseTime")]
    pub response_time_millis: u64,

    #[serde(rename = "lastChecked")]
    pub checked_at: DateTime<Utc>,
}

impl From<&ProbeRecord> for EndpointHealth {
    fn from(record: &ProbeRecord) -> Self {
        Self {
            endpoint_id: record.endpoint.id.clone(),
            status: record.status,
            response_time_millis: record.response_time_millis,
            checked_at: record.checked_at,
        }
    }
}

/// One `servers[]` entry of the published report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    #[serde(flatten)]
    pub health: EndpointHealth,

    pub name: String,
    pub url: String,

    /// Declared uptime string from the registry, passed through
    pub uptime: String,

    /// Absent when no enricher is configured
    #[serde(flatten)]
    pub enrichment: Option<Enrichment>,
}

impl ServerEntry {
    /// Merge a probe record with its optional enrichment
    pub fn new(record: ProbeRecord, enrichment: Option<Enrichment>) -> Self {
        let health = EndpointHealth::from(&record);
        let endpoint = record.endpoint;

        Self {
            health,
            name: endpoint.name,
            url: endpoint.url,
            uptime: endpoint.declared_uptime,
            enrichment,
        }
    }

    pub fn status(&self) -> EndpointStatus {
        self.health.status
    }
}

/// Status counts for a cycle; the three buckets always sum to `total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub online: usize,
    pub degraded: usize,
    pub offline: usize,
}

impl Summary {
    /// Count statuses
    pub fn from_statuses(statuses: impl IntoIterator<Item = EndpointStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut summary, status| {
            summary.total += 1;
            match status {
                EndpointStatus::Online => summary.online += 1,
                EndpointStatus::Degraded => summary.degraded += 1,
                EndpointStatus::Offline => summary.offline += 1,
            }
            summary
        })
    }

    /// Critical if anything is offline, warning if anything is degraded
    pub fn system_status(&self) -> SystemStatus {
        if self.offline > 0 {
            SystemStatus::Critical
        } else if self.degraded > 0 {
            SystemStatus::Warning
        } else {
            SystemStatus::Healthy
        }
    }
}

/// Aggregate result of one check cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealthReport {
    #[serde(rename = "status")]
    pub system_status: SystemStatus,

    pub timestamp: DateTime<Utc>,

    /// Registry order
    #[serde(rename = "servers")]
    pub endpoints: Vec<ServerEntry>,

    pub summary: Summary,
}

/// Combine a complete, registry-ordered set of entries into a report
///
/// Total over any input: an empty cycle is healthy with all counts at 0.
pub fn aggregate(entries: Vec<ServerEntry>, timestamp: DateTime<Utc>) -> SystemHealthReport {
    let summary = Summary::from_statuses(entries.iter().map(ServerEntry::status));

    SystemHealthReport {
        system_status: summary.system_status(),
        timestamp,
        endpoints: entries,
        summary,
    }
}
