//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use appmetrics_sim::config::SimulatorConfig;
use appmetrics_sim::driver::DriverStats;
use appmetrics_sim::generator::{MeasurementSource, Readings};
use appmetrics_sim::lifecycle::{Shutdown, Simulator, StartupError};
use appmetrics_sim::register::MetricsRegister;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A simulator running on an ephemeral local port.
pub struct Running {
    pub addr: SocketAddr,
    pub register: Arc<MetricsRegister>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<DriverStats, StartupError>>,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server and driver to stop.
    pub async fn stop(self) -> DriverStats {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("simulator did not stop")
            .unwrap()
            .unwrap()
    }
}

/// Defaults with console output off and logging left to the test harness.
pub fn test_config() -> SimulatorConfig {
    let mut config = SimulatorConfig::default();
    config.display.mode = appmetrics_sim::config::DisplayMode::Page;
    config.driver.interval_secs = 1;
    config.logging.enabled = false;
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config
}

pub fn readings(pairs: &[(&str, i64)]) -> Readings {
    pairs.iter().map(|(n, v)| (*n, *v)).collect()
}

/// Build and start a simulator around `source`.
pub async fn start_simulator(config: SimulatorConfig, source: Arc<dyn MeasurementSource>) -> Running {
    let simulator = Simulator::with_source(&config, source).unwrap();
    let register = simulator.register();

    let listener = TcpListener::bind(config.server.bind_address()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let run_shutdown = shutdown.clone();

    let handle = tokio::spawn(async move { simulator.run(listener, &run_shutdown).await });

    Running {
        addr,
        register,
        shutdown,
        handle,
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
