//! The create-receta flow: sequential dependent writes across two services.
//!
//! # Responsibilities
//! - Ensure every named product exists in the productos service
//! - Create the recipe in the recetas service with the full product list
//! - Read the backend's reply, falling back to the requested values
//!
//! # Design Decisions
//! - Product creation is idempotent at the step level: 201 (created) and
//!   409 (already exists) are both success
//! - Strictly sequential, abort on first failure, no compensation: products
//!   confirmed in earlier iterations stay created if a later step fails.
//!   At-least-once across the service boundary, deliberately not atomic.
//! - The flow is never restarted internally; retries live in the client

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::TimeoutConfig;
use crate::error::GatewayError;
use crate::resilience::ResilientClient;

/// Input to the flow, mapped from the SOAP operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecetaCreationRequest {
    pub nombre: String,
    /// Product names, order and duplicates preserved.
    pub productos: Vec<String>,
}

/// Outcome of a successful flow, to be serialized by the SOAP codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecetaCreationResult {
    pub id: Option<i64>,
    pub nombre: String,
    pub productos: Vec<String>,
}

#[derive(Serialize)]
struct ProductoPayload<'a> {
    nombre: &'a str,
}

#[derive(Serialize)]
struct RecetaPayload<'a> {
    nombre: &'a str,
    productos: &'a [String],
}

/// Shape of the recetas service's creation reply. Every field is optional:
/// a missing or unparsable reply falls back to the requested values.
#[derive(Debug, Default, Deserialize)]
struct RecetaReply {
    id: Option<i64>,
    nombre: Option<String>,
    productos: Option<Vec<String>>,
}

/// Runs the create-receta orchestration against the backend services.
pub struct RecetaOrchestrator {
    client: Arc<ResilientClient>,
    productos_timeout: Duration,
    recetas_timeout: Duration,
}

impl RecetaOrchestrator {
    pub fn new(client: Arc<ResilientClient>, timeouts: &TimeoutConfig) -> Self {
        Self {
            client,
            productos_timeout: Duration::from_secs(timeouts.upstream_secs),
            recetas_timeout: Duration::from_secs(timeouts.recetas_secs),
        }
    }

    /// Execute the flow. Steps run strictly in order and abort on the first
    /// failure; earlier product creations are left in place.
    pub async fn create_receta(
        &self,
        request: RecetaCreationRequest,
    ) -> Result<RecetaCreationResult, GatewayError> {
        for producto in &request.productos {
            self.ensure_product(producto).await?;
        }

        let reply = self.create_in_recetas(&request).await?;

        Ok(RecetaCreationResult {
            id: reply.id,
            nombre: reply.nombre.unwrap_or_else(|| request.nombre.clone()),
            productos: reply.productos.unwrap_or_else(|| request.productos.clone()),
        })
    }

    /// Create the product if it does not exist yet. 201 and 409 both mean
    /// the product is now known to the productos service.
    async fn ensure_product(&self, nombre: &str) -> Result<(), GatewayError> {
        let payload = serde_json::to_vec(&ProductoPayload { nombre })
            .map_err(|_| GatewayError::ServiceUnavailable {
                service: "productos".to_string(),
            })?;

        let response = self
            .client
            .call(
                Method::POST,
                "productos",
                "/productos",
                Some(Bytes::from(payload)),
                self.productos_timeout,
            )
            .await
            .map_err(|source| GatewayError::ProductEnsureFailed {
                producto: nombre.to_string(),
                source: Box::new(source),
            })?;

        match response.status {
            StatusCode::CREATED | StatusCode::CONFLICT => {
                tracing::debug!(producto = %nombre, status = %response.status, "product ensured");
                Ok(())
            }
            status => Err(GatewayError::ProductEnsureFailed {
                producto: nombre.to_string(),
                source: Box::new(GatewayError::UpstreamRejected {
                    service: "productos".to_string(),
                    status,
                    detail: body_excerpt(&response.body),
                }),
            }),
        }
    }

    async fn create_in_recetas(
        &self,
        request: &RecetaCreationRequest,
    ) -> Result<RecetaReply, GatewayError> {
        let payload = serde_json::to_vec(&RecetaPayload {
            nombre: &request.nombre,
            productos: &request.productos,
        })
        .map_err(|_| GatewayError::ServiceUnavailable {
            service: "recetas".to_string(),
        })?;

        let response = self
            .client
            .call(
                Method::POST,
                "recetas",
                "/recetas",
                Some(Bytes::from(payload)),
                self.recetas_timeout,
            )
            .await?;

        if !response.status.is_success() {
            return Err(GatewayError::UpstreamRejected {
                service: "recetas".to_string(),
                status: response.status,
                detail: body_excerpt(&response.body),
            });
        }

        // Unparsable success replies are not an error; the caller falls back
        // to the values it asked for.
        Ok(serde_json::from_slice(&response.body).unwrap_or_default())
    }
}

/// First part of a backend body, for error messages.
fn body_excerpt(body: &[u8]) -> String {
    const MAX: usize = 256;
    let text = String::from_utf8_lossy(body);
    if text.len() > MAX {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.into_owned()
    }
}
