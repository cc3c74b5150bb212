//! Measurement generation subsystem.
//!
//! # Data Flow
//! ```text
//! MeasurementSource::generate()
//!     → Readings (app1..appN, one value each)
//!     → register (store + process)
//! ```
//!
//! # Design Decisions
//! - Sources are trait objects so tests can substitute fixed or failing ones
//! - Values are uniform over an inclusive range
//! - Readings keep generation order

pub mod readings;
pub mod source;

pub use readings::{Reading, Readings};
pub use source::{
    app_name, generate_readings, FixedSource, MeasurementSource, RandomSource, SourceError,
    ValueBounds,
};
