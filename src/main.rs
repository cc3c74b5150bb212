//! appmetrics-sim
//!
//! Generates synthetic per-app metrics on a timer and serves them over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────── driver task ────────────────────────┐
//!   │  every interval_secs:                                       │
//!   │  generator ──▶ register.store ──▶ register.process          │
//!   │                         │                │                  │
//!   │                         ▼                ▼                  │
//!   │               metrics log (opt)   top_exceedances(k)        │
//!   │                                          │                  │
//!   │                                          ▼                  │
//!   │                             console sink + exceedance log   │
//!   └─────────────────────────────────────────────────────────────┘
//!                             ▲ shared Arc<MetricsRegister>
//!   ┌─────────────── HTTP (axum) ────────────┐
//!   │  GET /metrics    text exposition       │
//!   │  GET /exceeding  ranking page          │
//!   │  GET /health     liveness              │
//!   └────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use appmetrics_sim::lifecycle::{
    resolve_config, signals, ConfigOverrides, Shutdown, Simulator, StartupError,
};
use appmetrics_sim::observability::init_logging;

#[derive(Parser)]
#[command(name = "appmetrics-sim")]
#[command(about = "Synthetic application metrics generator and exporter", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`.
    #[arg(short, long)]
    port: Option<u16>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), &cli.overrides())?;

    init_logging(&config.logging)?;

    tracing::info!("appmetrics-sim v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        num_apps = config.generator.num_apps,
        threshold = config.exceedance.threshold,
        top_k = config.exceedance.top_k,
        interval_secs = config.driver.interval_secs,
        display_mode = ?config.display.mode,
        write_metrics = config.persistence.write_metrics,
        write_exceedances = config.persistence.write_exceedances,
        "Configuration loaded"
    );

    let simulator = Simulator::build(&config)?;

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        trigger.trigger();
    });

    simulator.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
