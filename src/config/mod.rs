//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SimulatorConfig (validated, immutable)
//!     → sections handed to each component at construction
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DisplayConfig, DisplayMode, DriverConfig, ExceedanceConfig, GeneratorConfig, LoggingConfig,
    PersistenceConfig, ServerConfig, SimulatorConfig,
};
pub use validation::{validate_config, ValidationError};
