//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! GET request
//!     → server.rs (Axum router, trace + timeout layers)
//!     → handlers.rs (read the shared register)
//!     → render.rs (text exposition / HTML page)
//!     → response
//! ```

pub mod handlers;
pub mod render;
pub mod server;

pub use server::{AppState, HttpServer};
