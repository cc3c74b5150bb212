//! The generate → store → process → report loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::{self, JoinError};
use tokio::time;

use crate::config::SimulatorConfig;
use crate::driver::policy::{NextStep, RetryPolicy};
use crate::driver::report::{ReportError, ReportSink};
use crate::generator::{MeasurementSource, SourceError};
use crate::register::{unix_timestamp, ExceedanceRecord, MetricsRegister, PersistError, RecordWriter};

/// Why one driver iteration failed.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("generation failed: {0}")]
    Source(#[from] SourceError),

    #[error("reporting failed: {0}")]
    Report(#[from] ReportError),

    #[error("exceedance log failed: {0}")]
    Persist(#[from] PersistError),

    #[error("iteration panicked: {0}")]
    Panicked(String),

    #[error("iteration task aborted: {0}")]
    Aborted(#[from] JoinError),
}

/// Per-cycle parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    pub threshold: i64,
    pub top_k: usize,
    pub interval: Duration,
}

impl DriverSettings {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            threshold: config.exceedance.threshold,
            top_k: config.exceedance.top_k,
            interval: Duration::from_secs(config.driver.interval_secs),
        }
    }
}

/// Iteration counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub iterations: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
}

/// Everything one iteration touches. Shared with the blocking pool each cycle.
#[derive(Clone)]
struct Cycle {
    source: Arc<dyn MeasurementSource>,
    register: Arc<MetricsRegister>,
    sink: Arc<dyn ReportSink>,
    exceedance_writer: Option<RecordWriter>,
    threshold: i64,
    top_k: usize,
}

impl Cycle {
    fn run(&self) -> Result<Vec<(String, u64)>, DriverError> {
        let readings = self.source.generate()?;
        self.register.store(readings.clone());
        self.register.process(&readings, self.threshold);

        let top = self.register.top_exceedances(self.top_k);
        self.sink.report(&top)?;

        if let Some(writer) = &self.exceedance_writer {
            writer.append(&ExceedanceRecord {
                timestamp: unix_timestamp(),
                top_apps: top.clone(),
            })?;
        }
        Ok(top)
    }

    /// `run`, with a panic anywhere in the body turned into an error.
    fn run_guarded(&self) -> Result<Vec<(String, u64)>, DriverError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run()))
            .unwrap_or_else(|payload| Err(DriverError::Panicked(panic_message(payload))))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Background loop feeding the register.
///
/// Each iteration runs on tokio's blocking pool: generation is CPU-bound in
/// `num_apps` and the sink and log appends do synchronous I/O.
pub struct PeriodicDriver {
    cycle: Arc<Cycle>,
    policy: RetryPolicy,
    stats: DriverStats,
}

impl PeriodicDriver {
    pub fn new(
        source: Arc<dyn MeasurementSource>,
        register: Arc<MetricsRegister>,
        sink: Arc<dyn ReportSink>,
        settings: DriverSettings,
    ) -> Self {
        Self {
            cycle: Arc::new(Cycle {
                source,
                register,
                sink,
                exceedance_writer: None,
                threshold: settings.threshold,
                top_k: settings.top_k,
            }),
            policy: RetryPolicy::retry_forever(settings.interval),
            stats: DriverStats::default(),
        }
    }

    /// Also append every cycle's ranking to an exceedance log.
    pub fn with_exceedance_writer(mut self, writer: RecordWriter) -> Self {
        let mut cycle = Arc::unwrap_or_clone(self.cycle);
        cycle.exceedance_writer = Some(writer);
        self.cycle = Arc::new(cycle);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Run one iteration body on the calling thread without sleeping.
    /// Returns the ranking handed to the sink. A panic in the body comes
    /// back as [`DriverError::Panicked`].
    pub fn run_once(&self) -> Result<Vec<(String, u64)>, DriverError> {
        self.cycle.run_guarded()
    }

    /// Loop until `shutdown` fires. Iteration failures never end the loop.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> DriverStats {
        tracing::info!(
            interval = ?self.policy.interval(),
            threshold = self.cycle.threshold,
            top_k = self.cycle.top_k,
            "Periodic driver starting"
        );

        loop {
            let next = self.step().await;
            tokio::select! {
                _ = time::sleep(next.delay()) => {}
                _ = shutdown.recv() => {
                    tracing::info!(
                        iterations = self.stats.iterations,
                        failures = self.stats.failures,
                        "Periodic driver received shutdown signal, exiting loop"
                    );
                    break;
                }
            }
        }
        self.stats
    }

    /// Run exactly `iterations` iterations, sleeping after each one.
    pub async fn run_iterations(&mut self, iterations: u64) -> DriverStats {
        for _ in 0..iterations {
            let next = self.step().await;
            time::sleep(next.delay()).await;
        }
        self.stats
    }

    async fn step(&mut self) -> NextStep {
        self.stats.iterations += 1;
        let iteration = self.stats.iterations;

        let cycle = Arc::clone(&self.cycle);
        let outcome = match task::spawn_blocking(move || cycle.run_guarded()).await {
            Ok(result) => result,
            Err(e) => Err(DriverError::from(e)),
        };

        match outcome {
            Ok(top) => {
                self.stats.consecutive_failures = 0;
                tracing::debug!(iteration, top = ?top, "Driver iteration complete");
                self.policy.on_success()
            }
            Err(e) => {
                self.stats.failures += 1;
                self.stats.consecutive_failures += 1;
                tracing::error!(
                    iteration,
                    consecutive_failures = self.stats.consecutive_failures,
                    error = %e,
                    "Driver iteration failed, retrying after interval"
                );
                self.policy.on_failure()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::report::{ConsoleSink, NoopSink};
    use crate::generator::{FixedSource, Readings};
    use std::sync::atomic::{AtomicU64, Ordering};

    const THRESHOLD: i64 = 10_000;

    fn settings() -> DriverSettings {
        DriverSettings {
            threshold: THRESHOLD,
            top_k: 3,
            interval: Duration::from_millis(1),
        }
    }

    fn fixed(pairs: &[(&str, i64)]) -> Arc<dyn MeasurementSource> {
        let readings: Readings = pairs.iter().map(|(n, v)| (*n, *v)).collect();
        Arc::new(FixedSource::new(readings))
    }

    fn register() -> Arc<MetricsRegister> {
        Arc::new(MetricsRegister::new(fixed(&[("app1", 1)])))
    }

    /// Fails on every odd call.
    struct FlakySource {
        calls: AtomicU64,
    }

    impl MeasurementSource for FlakySource {
        fn generate(&self) -> Result<Readings, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call % 2 == 0 {
                Err(SourceError::Unavailable(format!("call {}", call)))
            } else {
                Ok([("app1", THRESHOLD + 1)].into_iter().collect())
            }
        }
    }

    /// Panics on its first call, then behaves.
    struct PanicOnceSource {
        calls: AtomicU64,
    }

    impl MeasurementSource for PanicOnceSource {
        fn generate(&self) -> Result<Readings, SourceError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("generator blew up");
            }
            Ok([("app1", THRESHOLD + 1)].into_iter().collect())
        }
    }

    #[test]
    fn test_run_once_updates_register() {
        let register = register();
        let driver = PeriodicDriver::new(
            fixed(&[("app1", THRESHOLD + 1), ("app2", THRESHOLD - 1)]),
            register.clone(),
            Arc::new(NoopSink),
            settings(),
        );

        let top = driver.run_once().unwrap();
        assert_eq!(top, vec![("app1".to_string(), 1)]);
        assert_eq!(register.history_len(), 1);
        assert_eq!(register.exceedance_count("app1"), 1);
        assert_eq!(register.exceedance_count("app2"), 0);
    }

    #[test]
    fn test_console_sink_receives_ranking() {
        let sink = Arc::new(ConsoleSink::new(3, Vec::new()));
        let driver = PeriodicDriver::new(
            fixed(&[("app1", THRESHOLD + 1)]),
            register(),
            sink.clone(),
            settings(),
        );
        driver.run_once().unwrap();
        drop(driver);

        let sink = Arc::try_unwrap(sink).ok().unwrap();
        let printed = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(printed, "Top 3 apps exceeding threshold: [(\"app1\", 1)]\n");
    }

    #[tokio::test]
    async fn test_bounded_iterations() {
        let register = register();
        let mut driver = PeriodicDriver::new(
            fixed(&[("app1", THRESHOLD + 1), ("app2", THRESHOLD + 1)]),
            register.clone(),
            Arc::new(NoopSink),
            settings(),
        );

        let stats = driver.run_iterations(3).await;
        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.failures, 0);
        assert_eq!(register.history_len(), 3);
        assert_eq!(
            register.top_exceedances(5),
            vec![("app1".to_string(), 3), ("app2".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn test_loop_survives_failures() {
        let register = register();
        let mut driver = PeriodicDriver::new(
            Arc::new(FlakySource { calls: AtomicU64::new(0) }),
            register.clone(),
            Arc::new(NoopSink),
            settings(),
        );

        let stats = driver.run_iterations(10).await;
        assert_eq!(stats.iterations, 10);
        assert_eq!(stats.failures, 5);
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(register.history_len(), 5);
        assert_eq!(register.exceedance_count("app1"), 5);
    }

    #[test]
    fn test_run_once_reports_panic() {
        let driver = PeriodicDriver::new(
            Arc::new(PanicOnceSource { calls: AtomicU64::new(0) }),
            register(),
            Arc::new(NoopSink),
            settings(),
        );

        match driver.run_once() {
            Err(DriverError::Panicked(message)) => assert_eq!(message, "generator blew up"),
            other => panic!("expected a panic error, got {:?}", other),
        }
        assert_eq!(driver.run_once().unwrap(), vec![("app1".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_loop_survives_panicking_iteration() {
        let register = register();
        let mut driver = PeriodicDriver::new(
            Arc::new(PanicOnceSource { calls: AtomicU64::new(0) }),
            register.clone(),
            Arc::new(NoopSink),
            settings(),
        );

        let stats = driver.run_iterations(4).await;
        assert_eq!(stats.iterations, 4);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(register.history_len(), 3);
        assert_eq!(register.exceedance_count("app1"), 3);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (tx, rx) = broadcast::channel(1);
        let register = register();
        let driver = PeriodicDriver::new(
            fixed(&[("app1", 5)]),
            register.clone(),
            Arc::new(NoopSink),
            DriverSettings {
                interval: Duration::from_secs(3600),
                ..settings()
            },
        );

        let handle = tokio::spawn(driver.run(rx));
        while register.history_len() == 0 {
            tokio::task::yield_now().await;
        }
        tx.send(()).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats.iterations, 1);
    }

    #[test]
    fn test_exceedance_log_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/exceeding_log.txt");
        let driver = PeriodicDriver::new(
            fixed(&[("app1", THRESHOLD + 1)]),
            register(),
            Arc::new(NoopSink),
            settings(),
        )
        .with_exceedance_writer(RecordWriter::new(&path));

        driver.run_once().unwrap();
        driver.run_once().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let last: serde_json::Value = serde_json::from_str(content.lines().last().unwrap()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert_eq!(last["top_apps"], serde_json::json!([["app1", 2]]));
    }

    #[test]
    fn test_settings_from_config() {
        let settings = DriverSettings::from_config(&SimulatorConfig::default());
        assert_eq!(settings.threshold, 10_000);
        assert_eq!(settings.top_k, 3);
        assert_eq!(settings.interval, Duration::from_secs(30));
    }
}
