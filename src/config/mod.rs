//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (GATEWAY_CONFIG)
//!     → environment variable overrides (PRODUCTOS_URL, RETRY_MAX_ATTEMPTS, ...)
//!     → loader.rs semantic validation
//!     → GatewayConfig (validated, immutable)
//!     → shared by value / via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;

pub use loader::{load, ConfigError};
pub use schema::{
    BreakerConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, RetryConfig,
    ServicesConfig, TimeoutConfig,
};
