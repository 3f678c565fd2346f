//! Probe scheduler - fans probes out over every endpoint of a cycle.
//!
//! Every endpoint gets its own task. Inside that task the status probe and
//! the response-time probe run side by side, each bounded by the per-probe
//! timeout, so a full cycle takes roughly one timeout no matter how many
//! endpoints hang. Results are buffered by registry position and handed back
//! in registry order.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, warn};

use crate::classifier::classify;
use crate::endpoint::Endpoint;
use crate::error::CycleError;
use crate::probe::{ProbeOutcome, Prober};
use crate::status::EndpointStatus;

/// Everything learned about one endpoint during a cycle
#[derive(Debug, Clone)]
pub struct ProbeRecord {
    pub endpoint: Endpoint,
    pub outcome: ProbeOutcome,
    pub status: EndpointStatus,

    /// Independent response-time measurement, 0 when offline or when the
    /// measurement itself failed
    pub response_time_millis: u64,

    /// When the status probe resolved
    pub checked_at: DateTime<Utc>,
}

/// Probe scheduler - runs one probe task per endpoint and joins them all
pub struct ProbeScheduler {
    prober: Arc<dyn Prober>,
    probe_timeout: Duration,
    measure_response_time: bool,
}

impl ProbeScheduler {
    /// Create a new scheduler around `prober`
    pub fn new(prober: Arc<dyn Prober>, probe_timeout: Duration) -> Self {
        Self {
            prober,
            probe_timeout,
            measure_response_time: true,
        }
    }

    /// Enable or disable the second, independent response-time probe
    pub fn with_response_time_measurement(mut self, enable: bool) -> Self {
        self.measure_response_time = enable;
        self
    }

    /// The per-probe deadline
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Probe every endpoint concurrently and return results in input order
    ///
    /// Waits for every worker. Cancelling `cancel` cascades to all
    /// outstanding probes and turns the cycle into [`CycleError::Cancelled`];
    /// a probe hitting its own deadline only affects that endpoint.
    pub async fn run_cycle(
        &self,
        endpoints: Arc<[Endpoint]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProbeRecord>, CycleError> {
        let mut workers = JoinSet::new();

        for index in 0..endpoints.len() {
            let endpoints = Arc::clone(&endpoints);
            let prober = Arc::clone(&self.prober);
            let token = cancel.child_token();
            let deadline = self.probe_timeout;
            let measure = self.measure_response_time;
            let span = debug_span!("probe", endpoint = %endpoints[index].id);

            workers.spawn(
                async move {
                    let endpoint = &endpoints[index];
                    let record = tokio::select! {
                        _ = token.cancelled() => None,
                        record = check_endpoint(prober.as_ref(), endpoint, deadline, measure) => Some(record),
                    };
                    (index, record)
                }
                .instrument(span),
            );
        }

        let mut slots: Vec<Option<ProbeRecord>> = (0..endpoints.len()).map(|_| None).collect();
        let mut worker_error = None;

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, record)) => slots[index] = record,
                Err(e) if worker_error.is_none() => {
                    // Nothing useful can come out of this cycle anymore
                    workers.abort_all();
                    worker_error = Some(e);
                }
                Err(_) => {}
            }
        }

        if let Some(e) = worker_error {
            return Err(CycleError::Worker(e));
        }

        if cancel.is_cancelled() || slots.iter().any(Option::is_none) {
            warn!("Probe cycle cancelled with {} endpoint(s) registered", endpoints.len());
            return Err(CycleError::Cancelled);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// Probe one endpoint: status and response time side by side
async fn check_endpoint(
    prober: &dyn Prober,
    endpoint: &Endpoint,
    deadline: Duration,
    measure_response_time: bool,
) -> ProbeRecord {
    let (outcome, timing) = if measure_response_time {
        let (outcome, timing) = tokio::join!(
            bounded_probe(prober, endpoint, deadline),
            bounded_probe(prober, endpoint, deadline),
        );
        (outcome, Some(timing))
    } else {
        (bounded_probe(prober, endpoint, deadline).await, None)
    };

    let checked_at = Utc::now();
    let status = classify(&outcome);

    let response_time_millis = match (status, timing) {
        (EndpointStatus::Offline, _) => 0,
        (_, Some(timing)) if timing.succeeded => timing.elapsed_millis.unwrap_or(0),
        (_, Some(_)) => 0,
        (_, None) => outcome.elapsed_millis.unwrap_or(0),
    };

    debug!(
        status = %status,
        response_time_ms = response_time_millis,
        reason = %outcome.failure_reason,
        "Endpoint classified"
    );

    ProbeRecord {
        endpoint: endpoint.clone(),
        outcome,
        status,
        response_time_millis,
        checked_at,
    }
}

/// Run a probe under a hard deadline, whatever the prober does internally
async fn bounded_probe(prober: &dyn Prober, endpoint: &Endpoint, deadline: Duration) -> ProbeOutcome {
    timeout(deadline, prober.probe(endpoint, deadline))
        .await
        .unwrap_or_else(|_| ProbeOutcome::timed_out())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FailureReason;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// What a scripted endpoint does when probed
    #[derive(Clone)]
    enum Script {
        Respond { status: u16, after: Duration },
        Refuse,
        Hang,
        /// First call responds, every later call is refused
        RespondOnce { status: u16 },
    }

    /// Prober that ignores the network and follows a per-endpoint script
    struct ScriptedProber {
        scripts: HashMap<String, Script>,
        calls: AtomicUsize,
    }

    impl ScriptedProber {
        fn new(scripts: &[(&str, Script)]) -> Self {
            Self {
                scripts: scripts.iter().map(|(id, s)| (id.to_string(), s.clone())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, endpoint: &Endpoint, _timeout: Duration) -> ProbeOutcome {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.scripts.get(&endpoint.id).cloned().unwrap_or(Script::Refuse) {
                Script::Respond { status, after } => {
                    tokio::time::sleep(after).await;
                    ProbeOutcome::responded(status, after.as_millis() as u64)
                }
                Script::Refuse => ProbeOutcome::network_error("connection refused"),
                // Deliberately ignores the timeout it was handed
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    ProbeOutcome::responded(200, 3_600_000)
                }
                Script::RespondOnce { status } if call == 0 => ProbeOutcome::responded(status, 7),
                Script::RespondOnce { .. } => ProbeOutcome::network_error("connection reset"),
            }
        }
    }

    fn endpoints(ids: &[&str]) -> Arc<[Endpoint]> {
        ids.iter()
            .map(|id| Endpoint::new(*id, format!("server {id}"), format!("http://{id}.test")))
            .collect()
    }

    fn scheduler(prober: ScriptedProber, timeout_ms: u64) -> ProbeScheduler {
        ProbeScheduler::new(Arc::new(prober), Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn test_empty_cycle() {
        let scheduler = scheduler(ScriptedProber::new(&[]), 200);
        let records = scheduler.run_cycle(endpoints(&[]), &CancellationToken::new()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_registry_order() {
        // Completion order is the reverse of registry order
        let prober = ScriptedProber::new(&[
            ("a", Script::Respond { status: 200, after: Duration::from_millis(150) }),
            ("b", Script::Respond { status: 200, after: Duration::from_millis(80) }),
            ("c", Script::Respond { status: 200, after: Duration::from_millis(10) }),
        ]);
        let scheduler = scheduler(prober, 1_000);

        let records = scheduler
            .run_cycle(endpoints(&["a", "b", "c"]), &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.endpoint.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_hanging_endpoints_are_bounded_by_one_timeout() {
        let ids: Vec<String> = (0..20).map(|i| format!("hang-{i}")).collect();
        let scripts: Vec<(&str, Script)> = ids.iter().map(|id| (id.as_str(), Script::Hang)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let scheduler = scheduler(ScriptedProber::new(&scripts), 200);

        let start = Instant::now();
        let records = scheduler
            .run_cycle(endpoints(&id_refs), &CancellationToken::new())
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(records.len(), 20);
        assert!(elapsed < Duration::from_millis(1_500), "cycle took {elapsed:?}");
        for record in &records {
            assert_eq!(record.status, EndpointStatus::Offline);
            assert_eq!(record.outcome.failure_reason, FailureReason::Timeout);
            assert_eq!(record.response_time_millis, 0);
        }
    }

    #[tokio::test]
    async fn test_mixed_outcomes() {
        let prober = ScriptedProber::new(&[
            ("ok", Script::Respond { status: 200, after: Duration::from_millis(20) }),
            ("busy", Script::Respond { status: 503, after: Duration::from_millis(30) }),
            ("down", Script::Refuse),
            ("stuck", Script::Hang),
        ]);
        let scheduler = scheduler(prober, 300);

        let records = scheduler
            .run_cycle(endpoints(&["ok", "busy", "down", "stuck"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records[0].status, EndpointStatus::Online);
        assert!(records[0].response_time_millis >= 20);
        assert_eq!(records[1].status, EndpointStatus::Degraded);
        assert_eq!(records[1].outcome.http_status_code, Some(503));
        assert_eq!(records[2].status, EndpointStatus::Offline);
        assert_eq!(records[2].outcome.failure_reason, FailureReason::NetworkError);
        assert_eq!(records[2].response_time_millis, 0);
        assert_eq!(records[3].status, EndpointStatus::Offline);
        assert_eq!(records[3].outcome.failure_reason, FailureReason::Timeout);
    }

    #[tokio::test]
    async fn test_failed_timing_probe_keeps_status() {
        // join! polls the status request first, so it gets the answer and
        // the timing request is the one refused
        let prober = ScriptedProber::new(&[("flaky", Script::RespondOnce { status: 200 })]);
        let scheduler = scheduler(prober, 300);

        let records = scheduler
            .run_cycle(endpoints(&["flaky"]), &CancellationToken::new())
            .await
            .unwrap();

        let record = &records[0];
        assert!(record.outcome.succeeded);
        assert_eq!(record.outcome.http_status_code, Some(200));
        assert_eq!(record.status, EndpointStatus::Online);
        assert_eq!(record.response_time_millis, 0);
    }

    #[tokio::test]
    async fn test_status_probe_elapsed_without_measurement() {
        let prober = ScriptedProber::new(&[(
            "ok",
            Script::Respond { status: 204, after: Duration::from_millis(40) },
        )]);
        let scheduler = scheduler(prober, 500).with_response_time_measurement(false);

        let records = scheduler
            .run_cycle(endpoints(&["ok"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records[0].status, EndpointStatus::Online);
        assert_eq!(records[0].response_time_millis, 40);
    }

    #[tokio::test]
    async fn test_cancellation_cascades_to_all_probes() {
        let prober = ScriptedProber::new(&[("a", Script::Hang), ("b", Script::Hang)]);
        let scheduler = ProbeScheduler::new(Arc::new(prober), Duration::from_secs(30));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = scheduler.run_cycle(endpoints(&["a", "b"]), &cancel).await;

        assert!(matches!(result, Err(CycleError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
