//! Recetas gateway.
//!
//! A resilient HTTP gateway in front of the productos, recetas, and listas
//! catalog services.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                   GATEWAY                      │
//!   REST request ────┼─▶ http/proxy ──▶ resilience/client ──▶ backend │
//!                    │                      │                         │
//!                    │                 circuit breaker                │
//!                    │                      │                         │
//!   SOAP request ────┼─▶ soap/codec ─▶ orchestration ─▶ client ──▶ …  │
//!                    │                                                │
//!                    │  cross-cutting: config, registry, tracing      │
//!                    └───────────────────────────────────────────────┘
//! ```
//!
//! The REST surface relays backend responses verbatim; the SOAP surface
//! translates one envelope into a multi-step write across two services.
//! Both go through the same retrying, circuit-broken outbound client.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod registry;

// Dispatch
pub mod orchestration;
pub mod resilience;
pub mod soap;
