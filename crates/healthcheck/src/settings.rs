//! Engine settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::validation::validate_probe_timeout;
use crate::{DEFAULT_ENRICH_TIMEOUT_MS, DEFAULT_PROBE_TIMEOUT_MS};

/// HTTP method used for reachability requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    #[default]
    Get,
    Head,
}

/// Configuration options for a [`HealthEngine`](crate::HealthEngine)
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Hard deadline for each individual probe
    pub probe_timeout: Duration,

    /// Upper bound for a single enrichment call
    pub enrich_timeout: Duration,

    /// Issue a second, independent request to measure response time
    pub measure_response_time: bool,

    /// Request method for probes
    pub method: ProbeMethod,

    /// User agent sent with every probe
    pub user_agent: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            enrich_timeout: Duration::from_millis(DEFAULT_ENRICH_TIMEOUT_MS),
            measure_response_time: true,
            method: ProbeMethod::Get,
            user_agent: concat!("uppe-healthcheck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl EngineSettings {
    /// Set the per-probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the enrichment timeout
    pub fn with_enrich_timeout(mut self, timeout: Duration) -> Self {
        self.enrich_timeout = timeout;
        self
    }

    /// Enable or disable the separate response-time request
    pub fn with_response_time_measurement(mut self, enable: bool) -> Self {
        self.measure_response_time = enable;
        self
    }

    /// Set probe method
    pub fn with_method(mut self, method: ProbeMethod) -> Self {
        self.method = method;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the settings before an engine is built from them
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_probe_timeout(self.probe_timeout)?;

        if self.enrich_timeout.is_zero() {
            return Err(SettingsError::ZeroEnrichTimeout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();

        assert_eq!(settings.probe_timeout, Duration::from_secs(5));
        assert_eq!(settings.enrich_timeout, Duration::from_secs(2));
        assert!(settings.measure_response_time);
        assert_eq!(settings.method, ProbeMethod::Get);
        assert!(settings.user_agent.starts_with("uppe-healthcheck/"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_methods() {
        let settings = EngineSettings::default()
            .with_probe_timeout(Duration::from_millis(750))
            .with_enrich_timeout(Duration::from_millis(300))
            .with_response_time_measurement(false)
            .with_method(ProbeMethod::Head)
            .with_user_agent("status-page");

        assert_eq!(settings.probe_timeout, Duration::from_millis(750));
        assert_eq!(settings.enrich_timeout, Duration::from_millis(300));
        assert!(!settings.measure_response_time);
        assert_eq!(settings.method, ProbeMethod::Head);
        assert_eq!(settings.user_agent, "status-page");
    }

    #[test]
    fn test_invalid_settings() {
        let zero_probe = EngineSettings::default().with_probe_timeout(Duration::ZERO);
        assert!(matches!(zero_probe.validate(), Err(SettingsError::TimeoutTooShort(..))));

        let zero_enrich = EngineSettings::default().with_enrich_timeout(Duration::ZERO);
        assert!(matches!(zero_enrich.validate(), Err(SettingsError::ZeroEnrichTimeout)));
    }

    #[test]
    fn test_probe_method_serde() {
        let method: ProbeMethod = serde_json::from_str("\"HEAD\"").unwrap();
        assert_eq!(method, ProbeMethod::Head);
        assert_eq!(serde_json::to_string(&ProbeMethod::Get).unwrap(), "\"GET\"");
    }
}
