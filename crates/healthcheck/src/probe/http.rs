//! HTTP(S) reachability probe.

use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::debug;

use super::{ProbeOutcome, Prober};
use crate::endpoint::Endpoint;
use crate::error::SettingsError;
use crate::settings::{EngineSettings, ProbeMethod};

/// Probes endpoints with a single HTTP request
///
/// Any received response counts as reachable, whatever its status code;
/// classification happens later.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    method: ProbeMethod,
}

impl HttpProber {
    /// Build a prober sharing one connection pool across all probes
    pub fn new(settings: &EngineSettings) -> Result<Self, SettingsError> {
        // Probes measure direct reachability, never through a system proxy.
        // Redirects are not followed: a 3xx is the endpoint's own answer.
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, method: settings.method })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        match self.method {
            ProbeMethod::Get => self.client.get(url),
            ProbeMethod::Head => self.client.head(url),
        }
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &Endpoint, deadline: Duration) -> ProbeOutcome {
        let start = Instant::now();

        // Dropping the send future on deadline cancels the in-flight request,
        // including a connection that was accepted but never answered.
        let send = self.request(&endpoint.url).timeout(deadline).send();

        let outcome = match timeout(deadline, send).await {
            Err(_) => ProbeOutcome::timed_out(),
            Ok(Err(e)) if e.is_timeout() => ProbeOutcome::timed_out(),
            Ok(Err(e)) => ProbeOutcome::network_error(e.to_string()),
            Ok(Ok(response)) => {
                let elapsed = start.elapsed().as_millis() as u64;
                ProbeOutcome::responded(response.status().as_u16(), elapsed)
            }
        };

        debug!(
            endpoint = %endpoint.id,
            succeeded = outcome.succeeded,
            status_code = ?outcome.http_status_code,
            reason = %outcome.failure_reason,
            "Probe finished"
        );

        outcome
    }
}
