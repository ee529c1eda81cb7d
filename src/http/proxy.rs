//! REST pass-through to the backend services.
//!
//! # Responsibilities
//! - Forward GET (query string) and POST (JSON body) calls 1:1
//! - Relay the backend's status, content type, and raw body unmodified
//! - Map unreachable/open-circuit backends to a gateway-level 502
//!
//! # Design Decisions
//! - The gateway never reinterprets backend payloads on this path
//! - Timeouts are fixed per endpoint: recipe creation is the most expensive
//!   backend write, so recetas gets the larger timeout

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::GatewayError;
use crate::http::server::AppState;

pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    // Routes are /{service} and /{service}/ only, so the first segment is
    // the logical service name.
    let service = uri
        .path()
        .trim_start_matches('/')
        .trim_end_matches('/')
        .to_string();

    let mut path_and_query = format!("/{service}");
    if method == Method::GET {
        if let Some(query) = uri.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }
    }

    let body = match method {
        // Backends expect a JSON object even when the caller sent nothing.
        Method::POST => Some(if body.is_empty() {
            Bytes::from_static(b"{}")
        } else {
            body
        }),
        _ => None,
    };

    let timeout = timeout_for(&service, &state);

    tracing::debug!(service = %service, method = %method, "proxying request");

    match state
        .client
        .call(method, &service, &path_and_query, body, timeout)
        .await
    {
        Ok(upstream) => {
            let mut response = Response::builder().status(upstream.status);
            if let Some(content_type) = upstream.content_type {
                response = response.header(header::CONTENT_TYPE, content_type);
            }
            response
                .body(axum::body::Body::from(upstream.body))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Err(GatewayError::ServiceUnavailable { service }) => {
            tracing::warn!(service = %service, "backend unavailable");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("{service} service unavailable") })),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "proxy dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    }
}

fn timeout_for(service: &str, state: &AppState) -> Duration {
    if service == "recetas" {
        Duration::from_secs(state.timeouts.recetas_secs)
    } else {
        Duration::from_secs(state.timeouts.upstream_secs)
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn index() -> impl IntoResponse {
    Json(json!({ "msg": "API Recetas funcionando" }))
}
