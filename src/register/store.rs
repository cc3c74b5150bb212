//! The metrics register: snapshot history and exceedance counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::generator::{MeasurementSource, Readings};
use crate::register::persist::{unix_timestamp, MetricsRecord, PersistError, RecordWriter};

/// One stored generation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Unix epoch seconds at store time.
    pub timestamp: u64,
    pub readings: Readings,
}

#[derive(Default)]
struct RegisterState {
    /// Append-only; index i is the i-th `store` call.
    history: Vec<Snapshot>,
    /// Only apps that exceeded at least once have an entry.
    exceedances: BTreeMap<String, u64>,
}

/// Thread-safe store shared by the driver and the HTTP handlers.
///
/// A single coarse lock covers both the history and the counters so readers
/// never observe a half-applied cycle. File persistence happens after the
/// lock is released and its failures never reach the caller: they are logged
/// and counted in [`MetricsRegister::persist_failures`].
///
/// Ties in [`MetricsRegister::top_exceedances`] are ordered by app name.
pub struct MetricsRegister {
    state: RwLock<RegisterState>,
    fallback: Arc<dyn MeasurementSource>,
    metrics_writer: Option<RecordWriter>,
    persist_failures: AtomicU64,
}

impl MetricsRegister {
    /// Create an empty register. `fallback` supplies `latest()` before the first store.
    pub fn new(fallback: Arc<dyn MeasurementSource>) -> Self {
        Self {
            state: RwLock::new(RegisterState::default()),
            fallback,
            metrics_writer: None,
            persist_failures: AtomicU64::new(0),
        }
    }

    /// Also append every stored snapshot to a raw metrics log.
    pub fn with_metrics_writer(mut self, writer: RecordWriter) -> Self {
        self.metrics_writer = Some(writer);
        self
    }

    /// Append `(now, readings)` to the history.
    pub fn store(&self, readings: Readings) {
        let timestamp = unix_timestamp();
        let record = self.metrics_writer.as_ref().map(|_| MetricsRecord {
            timestamp,
            metrics: readings.clone(),
        });

        let cycle = {
            let mut state = self.write();
            state.history.push(Snapshot { timestamp, readings });
            state.history.len()
        };
        tracing::debug!(cycle, timestamp, "Stored snapshot");

        if let (Some(writer), Some(record)) = (&self.metrics_writer, record) {
            if let Err(e) = writer.append(&record) {
                self.record_persist_failure(&e);
            }
        }
    }

    /// Count one exceedance for every app whose value is strictly above `threshold`.
    pub fn process(&self, readings: &Readings, threshold: i64) {
        let mut state = self.write();
        for reading in readings.iter().filter(|r| r.value > threshold) {
            *state.exceedances.entry(reading.app_name.clone()).or_insert(0) += 1;
        }
    }

    /// Up to `k` apps with the most exceedances, highest first.
    pub fn top_exceedances(&self, k: usize) -> Vec<(String, u64)> {
        if k == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(String, u64)> = self
            .read()
            .exceedances
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();

        // Stable sort keeps the map's name order among equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Readings of the most recent snapshot, or a freshly generated set when empty.
    pub fn latest(&self) -> Readings {
        if let Some(snapshot) = self.read().history.last() {
            return snapshot.readings.clone();
        }

        match self.fallback.generate() {
            Ok(readings) => readings,
            Err(e) => {
                tracing::warn!(error = %e, "Fallback readings unavailable");
                Readings::new()
            }
        }
    }

    /// Number of stored snapshots.
    pub fn history_len(&self) -> usize {
        self.read().history.len()
    }

    /// The snapshot stored by the `index`-th `store` call.
    pub fn snapshot(&self, index: usize) -> Option<Snapshot> {
        self.read().history.get(index).cloned()
    }

    /// Exceedances counted for `app_name` (0 when it never exceeded).
    pub fn exceedance_count(&self, app_name: &str) -> u64 {
        self.read().exceedances.get(app_name).copied().unwrap_or(0)
    }

    /// Copy of all non-zero counters.
    pub fn exceedance_counts(&self) -> BTreeMap<String, u64> {
        self.read().exceedances.clone()
    }

    /// Number of raw metrics log writes that failed.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    fn record_persist_failure(&self, err: &PersistError) {
        let failures = self.persist_failures.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(error = %err, failures, "Failed to persist metrics snapshot");
    }

    // Every critical section leaves the state consistent, so a poisoned
    // lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, RegisterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegisterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
