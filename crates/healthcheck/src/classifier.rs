use crate::probe::ProbeOutcome;
use crate::status::EndpointStatus;

/// Map a probe outcome to a tri-state status
///
/// Only total unreachability is `Offline`. Any received response outside
/// 200..=399 is `Degraded`, including codes no HTTP server should send.
pub fn classify(outcome: &ProbeOutcome) -> EndpointStatus {
    if !outcome.succeeded {
        return EndpointStatus::Offline;
    }

    match outcome.http_status_code {
        Some(200..=399) => EndpointStatus::Online,
        Some(400..=599) => EndpointStatus::Degraded,
        // 1xx, >599 or a "success" without a code
        _ => EndpointStatus::Degraded,
    }
}
