//! Metrics register subsystem.
//!
//! # Data Flow
//! ```text
//! driver cycle:
//!     store(readings)     → history.push((now, readings))
//!                         → persist.rs (optional JSON line, outside the lock)
//!     process(readings)   → exceedance counters += 1 where value > threshold
//!
//! readers (driver + HTTP):
//!     top_exceedances(k)  → ranked copy of the counters
//!     latest()            → last snapshot, or generated fallback
//! ```
//!
//! # Design Decisions
//! - One RwLock over history and counters; reads copy out
//! - History is never pruned
//! - Persistence is best effort: failures are logged and counted, never returned

pub mod persist;
pub mod store;

pub use persist::{
    remove_previous, unix_timestamp, ExceedanceRecord, MetricsRecord, PersistError, RecordWriter,
};
pub use store::{MetricsRegister, Snapshot};
