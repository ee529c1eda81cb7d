//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum setup, request ID, timeout, trace)
//!     → proxy.rs (REST pass-through via the resilient client)
//!       or soap_handler.rs (envelope → orchestration → envelope)
//!     → response to client
//! ```

pub mod proxy;
pub mod server;
pub mod soap_handler;

pub use server::{AppState, GatewayServer};
