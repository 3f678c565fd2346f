use std::{env, fmt, fs, path, time::Duration};

use healthcheck::{DEFAULT_ENRICH_TIMEOUT_MS, DEFAULT_PROBE_TIMEOUT_MS, Endpoint, EngineSettings, ProbeMethod};
use logger::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    ReadFailed {
        path: path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("Invalid log setting: {0}")]
    InvalidLogging(String),
    #[error("No config path available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reloadable endpoint list, re-read before every cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints_file: Option<path::PathBuf>,

    /// Inline endpoints, used when no `endpoints_file` is set
    pub endpoints: Vec<Endpoint>,

    pub server: Server,
    pub logging: Logging,
    pub checks: Checks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Checks {
    pub timeout_ms: u64,
    pub enrich_timeout_ms: u64,
    pub measure_response_time: bool,
    pub method: ProbeMethod,

    /// Attach availability and last downtime derived from past cycles
    pub history: bool,
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080 }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self { level: "info".into(), format: "compact".into() }
    }
}

impl Default for Checks {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            enrich_timeout_ms: DEFAULT_ENRICH_TIMEOUT_MS,
            measure_response_time: true,
            method: ProbeMethod::default(),
            history: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints_file: None,
            endpoints: Vec::new(),
            server: Server::default(),
            logging: Logging::default(),
            checks: Checks::default(),
        }
    }
}

impl Checks {
    /// Engine settings described by this section
    pub fn to_settings(&self) -> EngineSettings {
        EngineSettings::default()
            .with_probe_timeout(Duration::from_millis(self.timeout_ms))
            .with_enrich_timeout(Duration::from_millis(self.enrich_timeout_ms))
            .with_response_time_measurement(self.measure_response_time)
            .with_method(self.method)
    }
}

impl Logging {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::InvalidLogging(format!("unknown level: {}", self.level)))
    }

    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.format.parse().map_err(ConfigError::InvalidLogging)
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/uppe/status-server.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("uppe/status-server.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Status Server Configuration:")?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;
        write_title_1(f, "Logging")?;
        write_1(f, "Level", &self.logging.level)?;
        write_1(f, "Format", &self.logging.format)?;
        write_title_1(f, "Checks")?;
        write_1(f, "Probe Timeout (ms)", &self.checks.timeout_ms)?;
        write_1(f, "Enrichment Timeout (ms)", &self.checks.enrich_timeout_ms)?;
        write_1(f, "Measure Response Time", &self.checks.measure_response_time)?;
        write_1(f, "Status History", &self.checks.history)?;
        write_title_1(f, "Endpoints")?;
        match &self.endpoints_file {
            Some(file) => write_1(f, "File", &file.display())?,
            None => write_1(f, "Inline", &self.endpoints.len())?,
        }

        Ok(())
    }
}

impl Config {
    /// Load the status server config from `optional_path`, or from
    /// `$XDG_CONFIG_HOME/uppe/status-server.toml` when none is given
    ///
    /// A missing file is created with the defaults, which are then returned.
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str).map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }
}
