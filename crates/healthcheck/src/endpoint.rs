use serde::{Deserialize, Serialize};

/// A named, addressable target under monitoring.
///
/// Endpoints are handed to a cycle as a read-only snapshot; nothing in the
/// engine mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Unique, stable identifier
    pub id: String,

    /// Display label
    pub name: String,

    /// Probe target
    pub url: String,

    /// Free-form historical uptime string, passed through untouched
    #[serde(default, alias = "uptime", alias = "declared_uptime")]
    pub declared_uptime: String,
}

impl Endpoint {
    /// Create a new endpoint with an empty declared uptime
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            declared_uptime: String::new(),
        }
    }

    /// Set the declared uptime string
    pub fn with_declared_uptime(mut self, uptime: impl Into<String>) -> Self {
        self.declared_uptime = uptime.into();
        self
    }
}
