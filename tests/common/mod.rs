//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use recetas_gateway::config::GatewayConfig;
use recetas_gateway::http::GatewayServer;

/// Start a programmable mock backend. The responder gets the zero-based
/// call index and the request path, and returns (status, JSON body).
/// Returns the backend's address and a hit counter.
pub async fn start_mock_backend<F>(responder: F) -> (SocketAddr, Arc<AtomicU32>)
where
    F: Fn(u32, &str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let responder = Arc::new(responder);

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let responder = responder.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                handle_connection(socket, responder, counter).await;
            });
        }
    });

    (addr, hits)
}

async fn handle_connection<F>(mut socket: TcpStream, responder: Arc<F>, counter: Arc<AtomicU32>)
where
    F: Fn(u32, &str) -> (u16, String) + Send + Sync + 'static,
{
    let request = read_request(&mut socket).await;
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let call = counter.fetch_add(1, Ordering::SeqCst);
    let (status, body) = responder(call, &path);

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Read headers plus a content-length body, so the client finishes writing
/// before we answer.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            break;
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(header_end) = find_header_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Gateway config pointing at the given backend addresses, with fast retry
/// timings for tests.
pub fn test_config(productos: SocketAddr, recetas: SocketAddr, listas: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.services.productos = format!("http://{productos}");
    config.services.recetas = format!("http://{recetas}");
    config.services.listas = format!("http://{listas}");
    config.retries.max_attempts = 3;
    config.retries.base_delay_ms = 20;
    config.retries.max_delay_ms = 100;
    config.breaker.failure_threshold = 5;
    config.breaker.cooldown_secs = 60;
    config
}

/// Spawn the gateway on an ephemeral port and return its address.
pub async fn spawn_gateway(config: GatewayConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// A non-pooled reqwest client, so circuit and retry behavior is observed
/// per request rather than per connection.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// An address nothing listens on, for connection-refused scenarios.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
