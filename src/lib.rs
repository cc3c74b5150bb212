//! Synthetic application metrics generator and exporter.
//!
//! A background driver fabricates one reading per simulated app every
//! interval, stores it in a shared [`MetricsRegister`], counts threshold
//! exceedances, and an HTTP server exposes the latest readings and the
//! top offenders.

pub mod config;
pub mod driver;
pub mod generator;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod register;

pub use config::SimulatorConfig;
pub use driver::PeriodicDriver;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, Simulator};
pub use register::MetricsRegister;
