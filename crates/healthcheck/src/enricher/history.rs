//! In-memory status history enricher.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};

use super::{Availability, Enrichment, MetricsEnricher, SslInfo, UNKNOWN};
use crate::endpoint::Endpoint;
use crate::status::EndpointStatus;

/// Derives availability and last downtime from the statuses it observes
///
/// Each `enrich` call records one observation for the endpoint. Nothing is
/// persisted; observations older than seven days are dropped, along with any
/// endpoint left without observations. Certificate
/// details are not inspected and stay unknown.
#[derive(Debug, Default)]
pub struct StatusHistoryEnricher {
    samples: Mutex<HashMap<String, VecDeque<(DateTime<Utc>, EndpointStatus)>>>,
}

impl StatusHistoryEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status` for `endpoint` at `now` and summarize its history
    pub fn enrich_at(
        &self,
        endpoint: &Endpoint,
        status: EndpointStatus,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Enrichment> {
        let mut samples = self.samples.lock().map_err(|_| anyhow!("status history lock poisoned"))?;
        let week_ago = now - Duration::days(7);

        // Ids no longer registered stop being enriched; drop them once their
        // observations age out
        samples.retain(|_, history| {
            while history.front().is_some_and(|(at, _)| *at < week_ago) {
                history.pop_front();
            }
            !history.is_empty()
        });

        let history = samples.entry(endpoint.id.clone()).or_default();
        history.push_back((now, status));

        let last_downtime = history
            .iter()
            .rev()
            .find(|(_, status)| *status == EndpointStatus::Offline)
            .map(|(at, _)| at.to_rfc3339())
            .unwrap_or_else(|| "none".to_string());

        Ok(Enrichment {
            ssl_info: SslInfo { is_valid: None, expires_in: UNKNOWN.to_string() },
            availability: Availability {
                last_24h: availability_since(history, now - Duration::hours(24)),
                last_7d: availability_since(history, week_ago),
            },
            last_downtime,
            response_history: Vec::new(),
        })
    }
}

/// Share of non-offline observations at or after `since`, as a percentage
fn availability_since(history: &VecDeque<(DateTime<Utc>, EndpointStatus)>, since: DateTime<Utc>) -> String {
    let (total, up) = history
        .iter()
        .filter(|(at, _)| *at >= since)
        .fold((0u32, 0u32), |(total, up), (_, status)| {
            (total + 1, up + u32::from(*status != EndpointStatus::Offline))
        });

    if total == 0 {
        return UNKNOWN.to_string();
    }

    format!("{:.1}%", f64::from(up) * 100.0 / f64::from(total))
}

#[async_trait::async_trait]
impl MetricsEnricher for StatusHistoryEnricher {
    async fn enrich(&self, endpoint: &Endpoint, status: EndpointStatus) -> anyhow::Result<Enrichment> {
        self.enrich_at(endpoint, status, Utc::now())
    }
}
