//! SOAP facade codec.
//!
//! # Data Flow
//! ```text
//! inbound bytes
//!     → document.rs (quick-xml events → owned element tree)
//!     → codec.rs (ordered lookup rules → SoapOperationRequest)
//!     → [orchestration runs the flow]
//!     → codec.rs (result or fault → envelope bytes)
//! ```

pub mod codec;
pub mod document;

pub use codec::{
    build_create_receta_response, build_fault, parse_create_receta, SoapOperationRequest,
};
