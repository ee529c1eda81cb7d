//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to backend:
//!     → circuit_breaker.rs (fail fast if the circuit is open)
//!     → client.rs (per-attempt timeout, retry loop)
//!     → On retryable failure: backoff.rs (exponential delay)
//!     → circuit_breaker.rs (record the final outcome)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Retries only for idempotent methods
//! - The breaker sees logical calls, not individual attempts

pub mod backoff;
pub mod circuit_breaker;
pub mod client;

pub use circuit_breaker::CircuitBreaker;
pub use client::{ResilientClient, RetryPolicy, UpstreamResponse};
