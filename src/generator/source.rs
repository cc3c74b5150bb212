//! Synthetic measurement sources.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::generator::readings::Readings;

/// Error produced by a measurement source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("invalid value bounds: min {min} is greater than max {max}")]
    InvalidBounds { min: i64, max: i64 },

    #[error("measurement source unavailable: {0}")]
    Unavailable(String),
}

/// Inclusive range that generated values are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueBounds {
    min: i64,
    max: i64,
}

impl ValueBounds {
    pub fn new(min: i64, max: i64) -> Result<Self, SourceError> {
        if min > max {
            return Err(SourceError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Name of the app at zero-based `index`.
pub fn app_name(index: usize) -> String {
    format!("app{}", index + 1)
}

/// Draw one uniform value per app for `app1..app{count}`.
pub fn generate_readings<R: Rng + ?Sized>(rng: &mut R, count: usize, bounds: ValueBounds) -> Readings {
    let mut readings = Readings::with_capacity(count);
    for index in 0..count {
        readings.insert(app_name(index), rng.gen_range(bounds.min..=bounds.max));
    }
    readings
}

/// Anything that can produce one cycle's readings.
pub trait MeasurementSource: Send + Sync {
    fn generate(&self) -> Result<Readings, SourceError>;
}

/// Uniformly random readings for a fixed set of apps.
pub struct RandomSource {
    count: usize,
    bounds: ValueBounds,
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// A source seeded from OS entropy.
    pub fn new(count: usize, bounds: ValueBounds) -> Self {
        Self::with_rng(count, bounds, StdRng::from_entropy())
    }

    /// A reproducible source.
    pub fn seeded(count: usize, bounds: ValueBounds, seed: u64) -> Self {
        Self::with_rng(count, bounds, StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, SourceError> {
        let bounds = ValueBounds::new(config.min_value, config.max_value)?;
        Ok(match config.seed {
            Some(seed) => Self::seeded(config.num_apps, bounds, seed),
            None => Self::new(config.num_apps, bounds),
        })
    }

    fn with_rng(count: usize, bounds: ValueBounds, rng: StdRng) -> Self {
        Self {
            count,
            bounds,
            rng: Mutex::new(rng),
        }
    }
}

impl MeasurementSource for RandomSource {
    fn generate(&self) -> Result<Readings, SourceError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(generate_readings(&mut *rng, self.count, self.bounds))
    }
}

/// Returns the same readings every cycle.
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    readings: Readings,
}

impl FixedSource {
    pub fn new(readings: Readings) -> Self {
        Self { readings }
    }
}

impl MeasurementSource for FixedSource {
    fn generate(&self) -> Result<Readings, SourceError> {
        Ok(self.readings.clone())
    }
}
