//! Integration tests for the REST proxy path: verbatim relay, retry with
//! backoff, and circuit breaking.

use std::sync::atomic::Ordering;
use std::time::Instant;

mod common;

#[tokio::test]
async fn relays_backend_response_verbatim() {
    let (productos, _) = common::start_mock_backend(|_, _| {
        (200, r#"[{"id":1,"nombre":"Leche"}]"#.to_string())
    })
    .await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let gateway = common::spawn_gateway(common::test_config(productos, recetas, listas)).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{gateway}/productos/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert_eq!(res.text().await.unwrap(), r#"[{"id":1,"nombre":"Leche"}]"#);
}

#[tokio::test]
async fn forwards_query_parameters() {
    let (productos, _) = common::start_mock_backend(|_, path| {
        if path == "/productos?nombre=Leche" {
            (200, r#"[{"id":1,"nombre":"Leche"}]"#.to_string())
        } else {
            (500, format!(r#"{{"error":"unexpected path {path}"}}"#))
        }
    })
    .await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let gateway = common::spawn_gateway(common::test_config(productos, recetas, listas)).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{gateway}/productos?nombre=Leche"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn retries_get_on_503_with_increasing_waits() {
    let (productos, hits) = common::start_mock_backend(|call, _| {
        if call < 2 {
            (503, r#"{"error":"warming up"}"#.to_string())
        } else {
            (200, "[]".to_string())
        }
    })
    .await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let gateway = common::spawn_gateway(common::test_config(productos, recetas, listas)).await;
    let client = common::http_client();

    let started = Instant::now();
    let res = client
        .get(format!("http://{gateway}/productos/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200, "should succeed after retries");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    // Two backoff waits: 20ms + 40ms.
    assert!(started.elapsed().as_millis() >= 60);
}

#[tokio::test]
async fn exhausted_retries_relay_final_503() {
    let (productos, hits) =
        common::start_mock_backend(|_, _| (503, r#"{"error":"down"}"#.to_string())).await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let gateway = common::spawn_gateway(common::test_config(productos, recetas, listas)).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{gateway}/productos/"))
        .send()
        .await
        .unwrap();

    // The backend's final answer is relayed, not replaced.
    assert_eq!(res.status(), 503);
    assert_eq!(hits.load(Ordering::SeqCst), 3, "max_attempts is 3");
}

#[tokio::test]
async fn never_retries_404() {
    let (productos, hits) =
        common::start_mock_backend(|_, _| (404, r#"{"error":"no such"}"#.to_string())).await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let gateway = common::spawn_gateway(common::test_config(productos, recetas, listas)).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{gateway}/productos/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_backend_yields_502_json() {
    let productos = common::unreachable_addr().await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let mut config = common::test_config(productos, recetas, listas);
    // POST is not retryable, so one attempt per call.
    config.retries.max_attempts = 2;

    let gateway = common::spawn_gateway(config).await;
    let client = common::http_client();

    let res = client
        .post(format!("http://{gateway}/productos/"))
        .json(&serde_json::json!({"nombre": "Leche"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "productos service unavailable");
}

#[tokio::test]
async fn open_circuit_short_circuits_calls() {
    let productos = common::unreachable_addr().await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, listas_hits) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let mut config = common::test_config(productos, recetas, listas);
    config.breaker.failure_threshold = 2;
    config.breaker.cooldown_secs = 60;

    let gateway = common::spawn_gateway(config).await;
    let client = common::http_client();

    // Two transport failures open the productos circuit.
    for _ in 0..2 {
        let res = client
            .post(format!("http://{gateway}/productos/"))
            .json(&serde_json::json!({"nombre": "Pan"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 502);
    }

    // A backend now comes up on the productos address; the open circuit
    // must still fail fast without touching it.
    let replacement = tokio::net::TcpListener::bind(productos).await.unwrap();
    let res = client
        .post(format!("http://{gateway}/productos/"))
        .json(&serde_json::json!({"nombre": "Pan"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    drop(replacement);

    // Other services are unaffected.
    let res = client
        .get(format!("http://{gateway}/listas/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(listas_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn consecutive_5xx_responses_open_the_circuit() {
    let (productos, hits) =
        common::start_mock_backend(|_, _| (500, r#"{"error":"boom"}"#.to_string())).await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let mut config = common::test_config(productos, recetas, listas);
    config.breaker.failure_threshold = 2;
    config.breaker.cooldown_secs = 60;

    let gateway = common::spawn_gateway(config).await;
    let client = common::http_client();

    // 500 is not a retryable status: one hit per call, each relayed to the
    // caller and counted by the breaker.
    for _ in 0..2 {
        let res = client
            .get(format!("http://{gateway}/productos/"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // The threshold is reached: the next call is short-circuited without a
    // backend hit.
    let res = client
        .get(format!("http://{gateway}/productos/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "productos service unavailable");
    assert_eq!(hits.load(Ordering::SeqCst), 2, "open circuit must not touch the backend");
}

#[tokio::test]
async fn health_endpoint() {
    let (productos, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (recetas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;
    let (listas, _) = common::start_mock_backend(|_, _| (200, "[]".to_string())).await;

    let gateway = common::spawn_gateway(common::test_config(productos, recetas, listas)).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{gateway}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
