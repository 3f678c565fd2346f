//! Endpoint registries.
//!
//! A registry hands out one immutable snapshot per cycle. The snapshot is
//! shared by every probe task of that cycle without locking; reloading only
//! ever happens between cycles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::RegistryError;
use crate::validation::validate_endpoints;

/// Source of the ordered endpoint list for a cycle
#[async_trait::async_trait]
pub trait EndpointRegistry: Send + Sync {
    /// Produce the endpoint snapshot for the next cycle
    async fn snapshot(&self) -> Result<Arc<[Endpoint]>, RegistryError>;
}

/// Fixed endpoint list, validated once at construction
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    endpoints: Arc<[Endpoint]>,
}

impl StaticRegistry {
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, RegistryError> {
        validate_endpoints(&endpoints)?;
        Ok(Self { endpoints: endpoints.into() })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

#[async_trait::async_trait]
impl EndpointRegistry for StaticRegistry {
    async fn snapshot(&self) -> Result<Arc<[Endpoint]>, RegistryError> {
        Ok(Arc::clone(&self.endpoints))
    }
}

/// On-disk endpoint list format
#[derive(Debug, Deserialize)]
struct EndpointFile {
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

/// Endpoint list read from a TOML file at the start of every cycle
///
/// ```toml
/// [[endpoints]]
/// id = "1"
/// name = "Web server"
/// url = "https://example.com/health"
/// declared_uptime = "99.9%"
/// ```
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl EndpointRegistry for FileRegistry {
    async fn snapshot(&self) -> Result<Arc<[Endpoint]>, RegistryError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|source| RegistryError::Read {
            path: self.path.clone(),
            source,
        })?;

        let file: EndpointFile = toml::from_str(&raw).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })?;

        validate_endpoints(&file.endpoints)?;
        debug!("Loaded {} endpoint(s) from {}", file.endpoints.len(), self.path.display());

        Ok(file.endpoints.into())
    }
}
