//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Clear old logs → Build register/driver/server → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop driver loop → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logging, then components, listener last
//! - The driver and server share one broadcast shutdown signal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{
    prepare_persistence, resolve_config, ConfigOverrides, LogWriters, Simulator, StartupError,
};
