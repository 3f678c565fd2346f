//! Health engine - one call, one cycle.
//!
//! The engine owns no timer and keeps no state between cycles; a periodic
//! caller decides how often [`HealthEngine::run_cycle`] runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aggregator::{ServerEntry, SystemHealthReport, aggregate};
use crate::enricher::{Enrichment, MetricsEnricher, enrich_all};
use crate::error::{CycleError, SettingsError};
use crate::probe::{HttpProber, Prober};
use crate::registry::EndpointRegistry;
use crate::scheduler::ProbeScheduler;
use crate::settings::EngineSettings;

/// Coordinates registry, scheduler, enricher and aggregator
pub struct HealthEngine {
    registry: Arc<dyn EndpointRegistry>,
    scheduler: ProbeScheduler,
    enricher: Option<Arc<dyn MetricsEnricher>>,
    enrich_timeout: Duration,
}

impl HealthEngine {
    /// Create an engine probing over HTTP
    pub fn new(registry: Arc<dyn EndpointRegistry>, settings: EngineSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let prober = Arc::new(HttpProber::new(&settings)?);

        Ok(Self::with_prober(registry, prober, &settings))
    }

    /// Create an engine around a custom prober
    pub fn with_prober(
        registry: Arc<dyn EndpointRegistry>,
        prober: Arc<dyn Prober>,
        settings: &EngineSettings,
    ) -> Self {
        let scheduler = ProbeScheduler::new(prober, settings.probe_timeout)
            .with_response_time_measurement(settings.measure_response_time);

        Self {
            registry,
            scheduler,
            enricher: None,
            enrich_timeout: settings.enrich_timeout,
        }
    }

    /// Attach a metrics enricher
    pub fn with_enricher(mut self, enricher: Arc<dyn MetricsEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Run one complete cycle
    pub async fn run_cycle(&self) -> Result<SystemHealthReport, CycleError> {
        self.run_cycle_until(&CancellationToken::new()).await
    }

    /// Run one complete cycle, abandoning it if `cancel` fires
    ///
    /// Returns either a report covering every registered endpoint or an
    /// error; never a partial report.
    pub async fn run_cycle_until(&self, cancel: &CancellationToken) -> Result<SystemHealthReport, CycleError> {
        let start = Instant::now();

        let endpoints = self
            .registry
            .snapshot()
            .await
            .inspect_err(|e| error!("Failed to load endpoints: {e}"))?;

        info!(endpoints = endpoints.len(), "Starting health check cycle");

        let records = self.scheduler.run_cycle(endpoints, cancel).await?;

        let enrichments: Vec<Option<Enrichment>> = match &self.enricher {
            Some(enricher) => {
                let enrich = enrich_all(enricher.as_ref(), &records, self.enrich_timeout);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(CycleError::Cancelled),
                    enrichments = enrich => enrichments.into_iter().map(Some).collect(),
                }
            }
            None => vec![None; records.len()],
        };

        let entries = records
            .into_iter()
            .zip(enrichments)
            .map(|(record, enrichment)| ServerEntry::new(record, enrichment))
            .collect();

        let report = aggregate(entries, Utc::now());

        info!(
            status = %report.system_status,
            total = report.summary.total,
            online = report.summary.online,
            degraded = report.summary.degraded,
            offline = report.summary.offline,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Health check cycle complete"
        );

        Ok(report)
    }
}
