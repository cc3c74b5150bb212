//! Periodic driver subsystem.
//!
//! # Data Flow
//! ```text
//! every interval:
//!     source.generate()
//!     → register.store() → register.process(threshold)
//!     → register.top_exceedances(k)
//!     → report.rs sink (console) + optional exceedance log
//!     → sleep(interval)
//! ```
//!
//! # Failure Handling
//! An iteration error is logged and the loop sleeps the normal interval
//! before trying again (`RetryPolicy::RetryForever`). A panic inside the
//! body is caught and counted as a failed iteration. Nothing in an
//! iteration can stop the loop; only the shutdown signal does.
//!
//! The body runs on tokio's blocking pool so generation and the
//! synchronous log/console writes never hold an async worker.

pub mod periodic;
pub mod policy;
pub mod report;

pub use periodic::{DriverError, DriverSettings, DriverStats, PeriodicDriver};
pub use policy::{NextStep, RetryPolicy};
pub use report::{format_ranking, sink_for, ConsoleSink, NoopSink, ReportError, ReportSink};
