//! Multi-service orchestration flows.
//!
//! One flow exists today: create-receta, driven by the SOAP facade. All
//! backend traffic goes through the resilient client; the flow itself never
//! retries or restarts.

pub mod create_receta;

pub use create_receta::{RecetaCreationRequest, RecetaCreationResult, RecetaOrchestrator};
