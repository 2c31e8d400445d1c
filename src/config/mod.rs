//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to Service::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the service starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ClientsConfig, HandshakeConfig, IdentityConfig, ListenerConfig, ObservabilityConfig,
    ServiceConfig, ShutdownConfig,
};
