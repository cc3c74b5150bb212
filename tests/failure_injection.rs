//! Failure injection tests: the driver and server keep going when dependencies fail.

use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use appmetrics_sim::driver::{DriverSettings, NoopSink, PeriodicDriver};
use appmetrics_sim::generator::{FixedSource, MeasurementSource, Readings, SourceError};
use appmetrics_sim::register::{MetricsRegister, RecordWriter};
use tokio::sync::broadcast;

mod common;

/// Fails the first `failures` calls, then succeeds.
struct RecoveringSource {
    calls: AtomicU64,
    failures: u64,
    readings: Readings,
}

impl MeasurementSource for RecoveringSource {
    fn generate(&self) -> Result<Readings, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(SourceError::Unavailable("upstream down".into()))
        } else {
            Ok(self.readings.clone())
        }
    }
}

struct AlwaysFailing;

/// Panics on its first call, then returns `readings`.
struct PanicsFirst {
    calls: AtomicU64,
    readings: Readings,
}

impl MeasurementSource for PanicsFirst {
    fn generate(&self) -> Result<Readings, SourceError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("source panicked");
        }
        Ok(self.readings.clone())
    }
}

impl MeasurementSource for AlwaysFailing {
    fn generate(&self) -> Result<Readings, SourceError> {
        Err(SourceError::Unavailable("never available".into()))
    }
}

fn settings() -> DriverSettings {
    DriverSettings {
        threshold: 10_000,
        top_k: 3,
        interval: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_driver_survives_persistent_failure() {
    let fallback = Arc::new(FixedSource::new(common::readings(&[("app1", 1)])));
    let register = Arc::new(MetricsRegister::new(fallback));
    let mut driver = PeriodicDriver::new(
        Arc::new(AlwaysFailing),
        register.clone(),
        Arc::new(NoopSink),
        settings(),
    );

    let stats = driver.run_iterations(25).await;
    assert_eq!(stats.iterations, 25);
    assert_eq!(stats.failures, 25);
    assert_eq!(stats.consecutive_failures, 25);
    assert_eq!(register.history_len(), 0);
}

#[tokio::test]
async fn test_driver_recovers_after_failures() {
    let fallback = Arc::new(FixedSource::new(Readings::new()));
    let register = Arc::new(MetricsRegister::new(fallback));
    let source = RecoveringSource {
        calls: AtomicU64::new(0),
        failures: 3,
        readings: common::readings(&[("app1", 10_001)]),
    };
    let mut driver = PeriodicDriver::new(Arc::new(source), register.clone(), Arc::new(NoopSink), settings());

    let stats = driver.run_iterations(5).await;
    assert_eq!(stats.failures, 3);
    assert_eq!(stats.consecutive_failures, 0);
    assert_eq!(register.top_exceedances(3), vec![("app1".to_string(), 2)]);
}

#[tokio::test]
async fn test_background_driver_survives_panic() {
    let fallback = Arc::new(FixedSource::new(Readings::new()));
    let register = Arc::new(MetricsRegister::new(fallback));
    let source = PanicsFirst {
        calls: AtomicU64::new(0),
        readings: common::readings(&[("app1", 10_001)]),
    };
    let driver = PeriodicDriver::new(
        Arc::new(source),
        register.clone(),
        Arc::new(NoopSink),
        DriverSettings {
            interval: Duration::from_millis(5),
            ..settings()
        },
    );

    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(driver.run(rx));

    let watched = register.clone();
    assert!(common::wait_until(|| watched.history_len() >= 2, Duration::from_secs(5)).await);
    assert!(!handle.is_finished());

    tx.send(()).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.failures, 1);
    assert!(stats.iterations >= 3);
    assert_eq!(register.top_exceedances(1)[0].0, "app1");
}

#[tokio::test]
async fn test_exceedance_log_failure_does_not_stop_loop() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"x").unwrap();

    let fallback = Arc::new(FixedSource::new(Readings::new()));
    let register = Arc::new(MetricsRegister::new(fallback));
    let source = Arc::new(FixedSource::new(common::readings(&[("app1", 10_001)])));
    let mut driver = PeriodicDriver::new(source, register.clone(), Arc::new(NoopSink), settings())
        .with_exceedance_writer(RecordWriter::new(blocker.join("exceeding_log.txt")));

    let stats = driver.run_iterations(4).await;
    assert_eq!(stats.failures, 4);
    assert_eq!(register.history_len(), 4);
    assert_eq!(register.exceedance_count("app1"), 4);
}

#[tokio::test]
async fn test_server_keeps_serving_with_broken_metrics_log() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"x").unwrap();

    let mut config = common::test_config();
    config.persistence.write_metrics = true;
    config.persistence.metrics_path = blocker.join("metrics_log.txt").to_string_lossy().into_owned();

    let source = Arc::new(FixedSource::new(common::readings(&[("app1", 42)])));
    let running = common::start_simulator(config, source).await;

    let register = running.register.clone();
    assert!(common::wait_until(|| register.persist_failures() >= 1, Duration::from_secs(5)).await);

    let res = common::client().get(running.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "bigquery_written_bytes{app_name=\"app1\"} 42");

    let stats = running.stop().await;
    assert_eq!(stats.failures, 0);
}

#[tokio::test]
async fn test_logs_written_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let metrics_path = dir.path().join("data/metrics_log.txt");
    let exceedances_path = dir.path().join("data/exceeding_log.txt");
    fs::create_dir_all(metrics_path.parent().unwrap()).unwrap();
    fs::write(&metrics_path, b"stale\n").unwrap();

    let mut config = common::test_config();
    config.persistence.write_metrics = true;
    config.persistence.metrics_path = metrics_path.to_string_lossy().into_owned();
    config.persistence.delete_previous_metrics = true;
    config.persistence.write_exceedances = true;
    config.persistence.exceedances_path = exceedances_path.to_string_lossy().into_owned();

    let source = Arc::new(FixedSource::new(common::readings(&[("app1", 10_001), ("app2", 5)])));
    let running = common::start_simulator(config, source).await;

    let register = running.register.clone();
    assert!(common::wait_until(|| register.history_len() >= 1, Duration::from_secs(5)).await);
    running.stop().await;

    let metrics_log = fs::read_to_string(&metrics_path).unwrap();
    assert!(!metrics_log.contains("stale"));
    let first: serde_json::Value = serde_json::from_str(metrics_log.lines().next().unwrap()).unwrap();
    assert_eq!(first["metrics"], serde_json::json!({"app1": 10_001, "app2": 5}));

    let exceedance_log = fs::read_to_string(&exceedances_path).unwrap();
    let first: serde_json::Value = serde_json::from_str(exceedance_log.lines().next().unwrap()).unwrap();
    assert_eq!(first["top_apps"], serde_json::json!([["app1", 1]]));
}
