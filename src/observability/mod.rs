//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!
//! Consumers:
//!     → logging.rs subscriber (stdout or log file)
//! ```
//!
//! # Design Decisions
//! - Structured fields (iteration, error, address) instead of formatted strings
//! - Filter directive comes from config, overridable with RUST_LOG

pub mod logging;

pub use logging::{init_logging, LoggingError};
