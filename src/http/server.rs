//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with proxy, SOAP, and health handlers
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Build the shared resilient client and orchestrator
//! - Bind the server to a listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Request};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{GatewayConfig, TimeoutConfig};
use crate::http::proxy::{health, index, proxy_handler};
use crate::http::soap_handler::soap_recetas;
use crate::orchestration::RecetaOrchestrator;
use crate::registry::ServiceRegistry;
use crate::resilience::{CircuitBreaker, ResilientClient, RetryPolicy};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ResilientClient>,
    pub orchestrator: Arc<RecetaOrchestrator>,
    pub timeouts: TimeoutConfig,
}

/// UUID v4 request IDs, set on entry and propagated to the response.
#[derive(Clone, Copy)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// The gateway HTTP server.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Build the server and its subsystems from configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let registry = Arc::new(ServiceRegistry::from_config(&config.services));
        let breaker = Arc::new(CircuitBreaker::new(
            config.breaker.failure_threshold,
            Duration::from_secs(config.breaker.cooldown_secs),
        ));
        let policy = RetryPolicy::from_config(&config.retries);
        let client = Arc::new(ResilientClient::new(registry, breaker, policy));
        let orchestrator = Arc::new(RecetaOrchestrator::new(client.clone(), &config.timeouts));

        let state = AppState {
            client,
            orchestrator,
            timeouts: config.timeouts.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/soap/recetas", post(soap_recetas));

        for path in [
            "/productos",
            "/productos/",
            "/recetas",
            "/recetas/",
            "/listas",
            "/listas/",
        ] {
            router = router.route(path, get(proxy_handler).post(proxy_handler));
        }

        router.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                ))),
        )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
