//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → handed to pool, liveness checker and dispatcher at startup
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new gateway list sent to the liveness checker
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; running with no file races the public gateways
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, LivenessConfig, ObservabilityConfig, RaceConfig, RelayConfig,
    DEFAULT_GATEWAYS,
};
pub use validation::{validate_config, ValidationError};
