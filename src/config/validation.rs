//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (bounds ordered, interval > 0)
//! - Check the exported metric name is a legal exposition name
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SimulatorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::SimulatorConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("generator.min_value ({min}) is greater than generator.max_value ({max})")]
    InvertedBounds { min: i64, max: i64 },

    #[error("generator.metric_name {0:?} is not a valid metric name")]
    InvalidMetricName(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("server.host must not be empty")]
    EmptyHost,

    #[error("{0} must not be empty while enabled")]
    EmptyPath(&'static str),

    #[error("logging.level {0:?} is not a valid filter directive")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &SimulatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let generator = &config.generator;
    if generator.min_value > generator.max_value {
        errors.push(ValidationError::InvertedBounds {
            min: generator.min_value,
            max: generator.max_value,
        });
    }
    if !is_valid_metric_name(&generator.metric_name) {
        errors.push(ValidationError::InvalidMetricName(generator.metric_name.clone()));
    }

    if config.driver.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("driver.interval_secs"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("server.request_timeout_secs"));
    }
    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    let persistence = &config.persistence;
    if persistence.write_metrics && persistence.metrics_path.trim().is_empty() {
        errors.push(ValidationError::EmptyPath("persistence.metrics_path"));
    }
    if persistence.write_exceedances && persistence.exceedances_path.trim().is_empty() {
        errors.push(ValidationError::EmptyPath("persistence.exceedances_path"));
    }

    if config.logging.enabled && EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Exposition names follow `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
