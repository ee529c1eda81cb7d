//! Gateway error taxonomy.
//!
//! # Responsibilities
//! - Classify failures by where they came from (caller, config, upstream)
//! - Carry enough context for the HTTP/SOAP boundary to render them
//!
//! # Design Decisions
//! - Protocol errors (bad SOAP input) are terminal: never retried
//! - Upstream errors distinguish "could not reach" from "reached but rejected"
//! - Conversion to wire output happens only in the `http` module

use axum::http::StatusCode;
use thiserror::Error;

/// Errors caused by the caller's SOAP payload. Surfaced as `Client` faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Malformed XML")]
    MalformedXml,

    #[error("Missing SOAP Body")]
    MissingBody,

    #[error("SOAP Body has no operation")]
    NoOperation,

    #[error("Missing receta nombre")]
    MissingNombre,
}

/// Errors raised while dispatching work to the backend services.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A logical service name that is not in the registry. Configuration or
    /// programming error, fatal to the request.
    #[error("unknown service '{0}'")]
    UnknownService(String),

    /// The backend could not be reached: transport failure after retries, or
    /// an open circuit short-circuiting the call.
    #[error("{service} service unavailable")]
    ServiceUnavailable { service: String },

    /// The backend answered with a status outside the accepted set for the
    /// step that issued the call.
    #[error("{service} rejected request with status {status}: {detail}")]
    UpstreamRejected {
        service: String,
        status: StatusCode,
        detail: String,
    },

    /// A product-ensure step of the create-receta flow failed. Names the
    /// product being processed; the source carries the underlying class.
    #[error("producto '{producto}': {source}")]
    ProductEnsureFailed {
        producto: String,
        #[source]
        source: Box<GatewayError>,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl GatewayError {
    /// SOAP 1.1 fault code for this error: `Client` for caller mistakes,
    /// `Server` for everything on the gateway/backend side.
    pub fn fault_code(&self) -> &'static str {
        match self {
            GatewayError::Protocol(_) => "Client",
            _ => "Server",
        }
    }
}
