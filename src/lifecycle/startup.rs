//! Startup orchestration.
//!
//! # Responsibilities
//! - Clear previous logs when configured
//! - Build the register, driver and HTTP server from one config
//! - Run the driver task next to the server until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - After startup nothing is fatal; the driver retries forever

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, validate_config, ConfigError, PersistenceConfig, SimulatorConfig};
use crate::driver::{sink_for, DriverSettings, DriverStats, PeriodicDriver};
use crate::generator::{MeasurementSource, RandomSource, SourceError};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::LoggingError;
use crate::register::{remove_previous, MetricsRegister, PersistError, RecordWriter};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("generator setup failed: {0}")]
    Source(#[from] SourceError),

    #[error("log file setup failed: {0}")]
    Persist(#[from] PersistError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Load `path` (or the defaults), apply `overrides`, then validate the result.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<SimulatorConfig, StartupError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SimulatorConfig::default(),
    };

    if let Some(host) = &overrides.host {
        config.server.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Writers for the raw metrics log and the exceedance log.
#[derive(Debug, Default)]
pub struct LogWriters {
    pub metrics: Option<RecordWriter>,
    pub exceedances: Option<RecordWriter>,
}

/// Delete previous logs if asked to and create the enabled writers.
pub fn prepare_persistence(config: &PersistenceConfig) -> Result<LogWriters, PersistError> {
    let mut writers = LogWriters::default();

    if config.write_metrics {
        if config.delete_previous_metrics && remove_previous(Path::new(&config.metrics_path))? {
            tracing::info!(path = %config.metrics_path, "Deleted previous metrics log");
        }
        writers.metrics = Some(RecordWriter::new(&config.metrics_path));
    }

    if config.write_exceedances {
        if config.delete_previous_exceedances
            && remove_previous(Path::new(&config.exceedances_path))?
        {
            tracing::info!(path = %config.exceedances_path, "Deleted previous exceedance log");
        }
        writers.exceedances = Some(RecordWriter::new(&config.exceedances_path));
    }

    Ok(writers)
}

/// A fully wired simulator, ready to run.
pub struct Simulator {
    register: Arc<MetricsRegister>,
    driver: PeriodicDriver,
    server: HttpServer,
}

impl Simulator {
    /// The driver and the `/metrics` fallback each get their own random
    /// source, so serving requests never advances the driver's seeded sequence.
    pub fn build(config: &SimulatorConfig) -> Result<Self, StartupError> {
        let source = Arc::new(RandomSource::from_config(&config.generator)?);
        let fallback = Arc::new(RandomSource::from_config(&config.generator)?);
        Self::with_sources(config, source, fallback)
    }

    /// Build around a caller-provided source (also used as the `/metrics` fallback).
    pub fn with_source(
        config: &SimulatorConfig,
        source: Arc<dyn MeasurementSource>,
    ) -> Result<Self, StartupError> {
        Self::with_sources(config, Arc::clone(&source), source)
    }

    pub fn with_sources(
        config: &SimulatorConfig,
        source: Arc<dyn MeasurementSource>,
        fallback: Arc<dyn MeasurementSource>,
    ) -> Result<Self, StartupError> {
        let writers = prepare_persistence(&config.persistence)?;

        let mut register = MetricsRegister::new(fallback);
        if let Some(writer) = writers.metrics {
            register = register.with_metrics_writer(writer);
        }
        let register = Arc::new(register);

        let sink = sink_for(config.display.mode, config.exceedance.top_k);
        let mut driver = PeriodicDriver::new(
            source,
            Arc::clone(&register),
            sink,
            DriverSettings::from_config(config),
        );
        if let Some(writer) = writers.exceedances {
            driver = driver.with_exceedance_writer(writer);
        }

        let server = HttpServer::new(Arc::clone(&register), config);

        Ok(Self {
            register,
            driver,
            server,
        })
    }

    pub fn register(&self) -> Arc<MetricsRegister> {
        Arc::clone(&self.register)
    }

    pub fn driver(&self) -> &PeriodicDriver {
        &self.driver
    }

    /// Serve on `listener` with the driver in the background until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<DriverStats, StartupError> {
        let driver = tokio::spawn(self.driver.run(shutdown.subscribe()));

        let served = self.server.run(listener, shutdown.subscribe()).await;
        shutdown.trigger();

        let stats = match driver.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "Driver task ended abnormally");
                DriverStats::default()
            }
        };
        tracing::info!(
            iterations = stats.iterations,
            failures = stats.failures,
            "Driver stopped"
        );

        served?;
        Ok(stats)
    }
}
