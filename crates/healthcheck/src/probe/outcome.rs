use serde::{Deserialize, Serialize};

/// Why a probe did not produce a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    Timeout,
    NetworkError,
    None,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::NetworkError => write!(f, "network-error"),
            FailureReason::None => write!(f, "none"),
        }
    }
}

/// Result of one reachability attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    /// Whether any HTTP response arrived before the deadline
    pub succeeded: bool,

    /// Status code of the received response
    pub http_status_code: Option<u16>,

    /// Time until the response arrived, in milliseconds
    pub elapsed_millis: Option<u64>,

    /// Failure cause, `None` when a response was received
    pub failure_reason: FailureReason,

    /// Transport error text, for logs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProbeOutcome {
    /// A response with `status_code` arrived after `elapsed_millis`
    pub fn responded(status_code: u16, elapsed_millis: u64) -> Self {
        Self {
            succeeded: true,
            http_status_code: Some(status_code),
            elapsed_millis: Some(elapsed_millis),
            failure_reason: FailureReason::None,
            detail: None,
        }
    }

    /// The deadline elapsed before any response arrived
    pub fn timed_out() -> Self {
        Self {
            succeeded: false,
            http_status_code: None,
            elapsed_millis: None,
            failure_reason: FailureReason::Timeout,
            detail: None,
        }
    }

    /// The transport failed before the deadline
    pub fn network_error(detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            http_status_code: None,
            elapsed_millis: None,
            failure_reason: FailureReason::NetworkError,
            detail: Some(detail.into()),
        }
    }
}
