//! SOAP endpoint: the fault boundary.
//!
//! Every outcome of `POST /soap/recetas` is a well-formed envelope with
//! transport status 200: either a CreateRecetaResponse or a Fault whose
//! code is `Client` (bad payload) or `Server` (gateway/backend failure).
//! No raw error ever crosses this boundary.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;
use crate::orchestration::RecetaCreationRequest;
use crate::soap;

pub async fn soap_recetas(State(state): State<AppState>, body: Bytes) -> Response {
    let operation = match soap::parse_create_receta(&body) {
        Ok(operation) => operation,
        Err(error) => {
            tracing::warn!(error = %error, "rejected SOAP payload");
            return soap_response(soap::build_fault("Client", &error.to_string()));
        }
    };

    tracing::info!(
        operation = %operation.operation,
        nombre = %operation.nombre,
        productos = operation.productos.len(),
        "SOAP create receta"
    );

    let request = RecetaCreationRequest {
        nombre: operation.nombre,
        productos: operation.productos,
    };

    match state.orchestrator.create_receta(request).await {
        Ok(result) => soap_response(soap::build_create_receta_response(&result)),
        Err(error) => {
            tracing::warn!(error = %error, "create receta flow failed");
            soap_response(soap::build_fault(error.fault_code(), &error.to_string()))
        }
    }
}

fn soap_response(xml: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], xml).into_response()
}
