//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the simulator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the metrics simulator.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Synthetic reading generation.
    pub generator: GeneratorConfig,

    /// Threshold and ranking settings.
    pub exceedance: ExceedanceConfig,

    /// Periodic driver settings.
    pub driver: DriverConfig,

    /// Where the top offenders are shown.
    pub display: DisplayConfig,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Raw metrics and exceedance log files.
    pub persistence: PersistenceConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of simulated applications (`app1..appN`).
    pub num_apps: usize,

    /// Inclusive lower bound of generated values.
    pub min_value: i64,

    /// Inclusive upper bound of generated values.
    pub max_value: i64,

    /// Metric name used in the text exposition.
    pub metric_name: String,

    /// Optional RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_apps: 10,
            min_value: 1,
            max_value: 12_000,
            metric_name: "bigquery_written_bytes".to_string(),
            seed: None,
        }
    }
}

/// Exceedance tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ExceedanceConfig {
    /// A reading counts as exceeding when strictly greater than this.
    pub threshold: i64,

    /// Number of apps in the ranking.
    pub top_k: usize,
}

impl Default for ExceedanceConfig {
    fn default() -> Self {
        Self {
            threshold: 10_000,
            top_k: 3,
        }
    }
}

/// Periodic driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    /// Seconds between generation cycles.
    pub interval_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

/// Where the ranking is displayed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Console,
    Page,
    #[default]
    Both,
}

impl DisplayMode {
    /// Whether the ranking is printed every cycle.
    pub fn shows_console(self) -> bool {
        matches!(self, DisplayMode::Console | DisplayMode::Both)
    }

    /// Whether `/exceeding` serves the ranking page.
    pub fn shows_page(self) -> bool {
        matches!(self, DisplayMode::Page | DisplayMode::Both)
    }
}

/// Display configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub mode: DisplayMode,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_secs: 10,
        }
    }
}

/// File persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Append every stored snapshot to `metrics_path`.
    pub write_metrics: bool,

    /// Raw metrics log (newline-delimited JSON).
    pub metrics_path: String,

    /// Delete `metrics_path` at startup.
    pub delete_previous_metrics: bool,

    /// Append every cycle's ranking to `exceedances_path`.
    pub write_exceedances: bool,

    /// Exceedance log (newline-delimited JSON).
    pub exceedances_path: String,

    /// Delete `exceedances_path` at startup.
    pub delete_previous_exceedances: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            write_metrics: false,
            metrics_path: "data/metrics_log.txt".to_string(),
            delete_previous_metrics: false,
            write_exceedances: false,
            exceedances_path: "data/exceeding_log.txt".to_string(),
            delete_previous_exceedances: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or a full directive).
    pub level: String,

    /// Log to this file instead of stdout.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            file: None,
        }
    }
}
