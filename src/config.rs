//! Configuration types for btc-backtest

use serde::Deserialize;
use std::path::PathBuf;

use crate::engine::SimulationConfig;
use crate::optimizer::OptimizerConfig;
use crate::telemetry::LogFormat;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Bar source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding captured JSON bar files
    #[serde(default = "default_bars_dir")]
    pub bars_dir: PathBuf,

    /// When set, use the seeded synthetic provider instead of files
    #[serde(default)]
    pub synthetic_seed: Option<u64>,
}

fn default_bars_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            bars_dir: default_bars_dir(),
            synthetic_seed: None,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
