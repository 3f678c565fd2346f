//! Validation for endpoint lists and probe settings.
//!
//! Registries run [`validate_endpoints`] on every snapshot they hand out, so a
//! cycle never starts with a malformed endpoint list.

use std::collections::HashSet;
use std::time::Duration;

use url::Url;

use crate::endpoint::Endpoint;
use crate::error::{RegistryError, SettingsError};

const MIN_PROBE_TIMEOUT: Duration = Duration::from_millis(100);
const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

/// Validate an ordered endpoint list: non-empty unique ids and HTTP(S) targets
pub fn validate_endpoints(endpoints: &[Endpoint]) -> Result<(), RegistryError> {
    let mut seen = HashSet::with_capacity(endpoints.len());

    for (position, endpoint) in endpoints.iter().enumerate() {
        if endpoint.id.trim().is_empty() {
            return Err(RegistryError::EmptyId(position));
        }

        if !seen.insert(endpoint.id.as_str()) {
            return Err(RegistryError::DuplicateId(endpoint.id.clone()));
        }

        validate_target_url(&endpoint.url).map_err(|reason| RegistryError::InvalidUrl {
            id: endpoint.id.clone(),
            reason,
        })?;
    }

    Ok(())
}

/// Validate URL format and scheme
fn validate_target_url(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme: {other}")),
    }

    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }

    if url.port() == Some(0) {
        return Err("port 0 is not valid".to_string());
    }

    Ok(())
}

/// Validate the per-probe timeout is reasonable
pub fn validate_probe_timeout(timeout: Duration) -> Result<(), SettingsError> {
    if timeout < MIN_PROBE_TIMEOUT {
        return Err(SettingsError::TimeoutTooShort(timeout, MIN_PROBE_TIMEOUT));
    }

    if timeout > MAX_PROBE_TIMEOUT {
        return Err(SettingsError::TimeoutTooLong(timeout, MAX_PROBE_TIMEOUT));
    }

    Ok(())
}
