//! Tracing setup shared by the Uppe status binaries.

use std::env::var;
use std::str::FromStr;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Initialize tracing at `INFO` in compact format
pub fn init_tracing() -> Result<(), TryInitError> {
    init_with(LevelFilter::INFO, LogFormat::default())
}

/// Initialize tracing with a default level and format
///
/// `RUST_LOG` still overrides the level and `RUST_LOG_FORMAT` the format.
pub fn init_with(level: LevelFilter, format: LogFormat) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let (format, rejected) = match var("RUST_LOG_FORMAT").map(|value| value.parse::<LogFormat>()) {
        Ok(Ok(from_env)) => (from_env, None),
        Ok(Err(error)) => (format, Some(error)),
        Err(_) => (format, None),
    };

    let log_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).try_init()?;

    if let Some(error) = rejected {
        warn!("Ignoring RUST_LOG_FORMAT, falling back to {format:?}: {error}");
    }

    Ok(())
}
