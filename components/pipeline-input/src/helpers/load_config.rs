// Local crates
use crate::input::input::InputConfig;

// External crates
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

/// Process wide settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeneralConfig {
    /// How long `run` waits for the input to confirm it closed
    pub shutdown_timeout_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_ms: 5000,
        }
    }
}

impl GeneralConfig {
    /// `shutdown_timeout_ms` as a [`Duration`]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Format of the stderr log sink
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Tracing subscriber settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, `RUST_LOG` takes precedence when set
    pub level: String,
    /// Output format of the stderr sink
    pub format: LogFormat,
    /// Also write logs to a daily rolling file in this directory
    pub directory: Option<PathBuf>,
    /// Serve task instrumentation to `tokio-console`
    pub tokio_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
            tokio_console: false,
        }
    }
}

/// Prometheus endpoint settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `GET /metrics` while running
    pub enabled: bool,
    /// Address the metrics server binds to
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1:9000".to_string(),
        }
    }
}

/// Application configuration file
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// `[general]`
    #[serde(default)]
    pub general: GeneralConfig,
    /// `[logging]`
    #[serde(default)]
    pub logging: LoggingConfig,
    /// `[metrics]`
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// `[input]`, the input tree to run
    pub input: InputConfig,
}

impl Config {
    /// Load and parse the configuration file
    #[instrument(
        name = "config_loader",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        tracing::trace!(
            configuration_file_path = %path_ref.display(),
            "Loading pipeline input configuration file"
        );

        let config_str = match fs::read_to_string(path_ref) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read configuration file");
                return Err(e)
                    .with_context(|| format!("Failed to read config file at {:?}", path_ref));
            }
        };

        let config = Self::parse(&config_str)
            .with_context(|| format!("Failed to parse TOML from {:?}", path_ref))?;

        tracing::trace!(configuration_file_path = %path_ref.display(), "Pipeline input configuration file loaded successfully");
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse(config_str: &str) -> Result<Self> {
        match toml::from_str(config_str) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML configuration");
                Err(e.into())
            }
        }
    }
}
