//! Resilient outbound HTTP client.
//!
//! # Responsibilities
//! - Resolve logical service names and gate calls through the circuit breaker
//! - Issue HTTP calls with per-attempt timeouts
//! - Retry retryable outcomes with exponential backoff
//! - Report exactly one success/failure per logical call to the breaker
//!
//! # Design Decisions
//! - Retries only for configured (idempotent) methods; connection errors and
//!   timeouts count as retryable outcomes, like configured status codes
//! - The breaker sees the final outcome only: however many attempts a call
//!   took, it records one success or one failure
//! - 5xx responses are recorded as failures but still returned to the
//!   caller; deciding what a status means is the caller's job

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::RetryConfig;
use crate::error::GatewayError;
use crate::registry::ServiceRegistry;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::circuit_breaker::CircuitBreaker;

/// Upper bound on a buffered backend response body.
const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024;

/// Immutable retry policy shared by every outbound call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub retryable_status: HashSet<u16>,
    pub retryable_methods: HashSet<Method>,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            retryable_status: config.retryable_status.iter().copied().collect(),
            retryable_methods: config
                .retryable_methods
                .iter()
                .filter_map(|m| m.parse().ok())
                .collect(),
        }
    }
}

/// A backend response, buffered so callers can relay or parse it.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// The outcome of the attempt loop, before breaker accounting.
enum Outcome {
    Response(hyper::Response<hyper::body::Incoming>),
    Transport,
}

/// Issues outbound HTTP calls with retry, backoff, and circuit breaking.
pub struct ResilientClient {
    registry: Arc<ServiceRegistry>,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
    client: Client<HttpConnector, Body>,
}

impl ResilientClient {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        breaker: Arc<CircuitBreaker>,
        policy: RetryPolicy,
    ) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            registry,
            breaker,
            policy,
            client,
        }
    }

    /// Call `service` at `path_and_query` and return its buffered response.
    ///
    /// An open circuit fails immediately with `ServiceUnavailable` and does
    /// not consume retry attempts. A JSON `body` is sent with the matching
    /// content type. `timeout` bounds each individual attempt.
    pub async fn call(
        &self,
        method: Method,
        service: &str,
        path_and_query: &str,
        body: Option<Bytes>,
        timeout: Duration,
    ) -> Result<UpstreamResponse, GatewayError> {
        let base = self.registry.resolve(service)?;

        if self.breaker.is_open(service) {
            tracing::warn!(service = %service, "circuit open, short-circuiting call");
            return Err(GatewayError::ServiceUnavailable {
                service: service.to_string(),
            });
        }

        let uri = format!("{base}{path_and_query}");
        let method_retryable = self.policy.retryable_methods.contains(&method);
        let mut attempt = 0u32;

        let outcome = loop {
            attempt += 1;

            let request = self
                .build_request(&method, &uri, body.as_ref())
                .map_err(|_| GatewayError::ServiceUnavailable {
                    service: service.to_string(),
                })?;

            match time::timeout(timeout, self.client.request(request)).await {
                Ok(Ok(response)) => {
                    let status = response.status();
                    let retryable = method_retryable
                        && self.policy.retryable_status.contains(&status.as_u16());
                    if retryable && attempt < self.policy.max_attempts {
                        let delay = self.backoff(attempt);
                        tracing::info!(
                            service = %service,
                            attempt,
                            status = %status,
                            delay = ?delay,
                            "retrying after retryable status"
                        );
                        time::sleep(delay).await;
                        continue;
                    }
                    break Outcome::Response(response);
                }
                Ok(Err(error)) => {
                    tracing::warn!(service = %service, attempt, error = %error, "transport error");
                    if method_retryable && attempt < self.policy.max_attempts {
                        let delay = self.backoff(attempt);
                        time::sleep(delay).await;
                        continue;
                    }
                    break Outcome::Transport;
                }
                Err(_) => {
                    tracing::warn!(service = %service, attempt, timeout = ?timeout, "attempt timed out");
                    if method_retryable && attempt < self.policy.max_attempts {
                        let delay = self.backoff(attempt);
                        time::sleep(delay).await;
                        continue;
                    }
                    break Outcome::Transport;
                }
            }
        };

        match outcome {
            Outcome::Transport => {
                self.breaker.record_failure(service);
                Err(GatewayError::ServiceUnavailable {
                    service: service.to_string(),
                })
            }
            Outcome::Response(response) => {
                let status = response.status();
                let content_type = response.headers().get(header::CONTENT_TYPE).cloned();

                let body = match axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
                    .await
                {
                    Ok(bytes) => bytes,
                    Err(error) => {
                        // The connection died mid-body; same as never reaching
                        // the backend.
                        tracing::warn!(service = %service, error = %error, "failed reading response body");
                        self.breaker.record_failure(service);
                        return Err(GatewayError::ServiceUnavailable {
                            service: service.to_string(),
                        });
                    }
                };

                if status.is_server_error() {
                    self.breaker.record_failure(service);
                } else {
                    self.breaker.record_success(service);
                }

                Ok(UpstreamResponse {
                    status,
                    content_type,
                    body,
                })
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.policy.base_delay_ms, self.policy.max_delay_ms)
    }

    fn build_request(
        &self,
        method: &Method,
        uri: &str,
        body: Option<&Bytes>,
    ) -> Result<Request<Body>, axum::http::Error> {
        let mut builder = Request::builder().method(method.clone()).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        builder.body(match body {
            Some(bytes) => Body::from(bytes.clone()),
            None => Body::empty(),
        })
    }
}
