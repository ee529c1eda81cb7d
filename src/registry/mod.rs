//! Logical service name resolution.
//!
//! # Responsibilities
//! - Map a logical service name (productos, recetas, listas) to its base address
//! - Reject unknown names with a typed error
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Base addresses are stored without a trailing slash so path joins are
//!   simple string concatenation

use std::collections::HashMap;

use crate::config::ServicesConfig;
use crate::error::GatewayError;

/// Read-only map from logical service name to base address.
#[derive(Debug)]
pub struct ServiceRegistry {
    services: HashMap<String, String>,
}

impl ServiceRegistry {
    /// Build the registry from configuration.
    pub fn from_config(services: &ServicesConfig) -> Self {
        let mut map = HashMap::new();
        for (name, addr) in [
            ("productos", &services.productos),
            ("recetas", &services.recetas),
            ("listas", &services.listas),
        ] {
            map.insert(name.to_string(), addr.trim_end_matches('/').to_string());
        }
        Self { services: map }
    }

    /// Resolve a logical service name to its base address.
    pub fn resolve(&self, name: &str) -> Result<&str, GatewayError> {
        self.services
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| GatewayError::UnknownService(name.to_string()))
    }

}
