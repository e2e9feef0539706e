//! The HTTP health endpoint and the WebSocket handshake's token check,
//! exercised independently of the quiz engine itself.


use std::sync::Arc;

use axum_test::TestServer;
use serde_json::Value;

use quiz_session_core::auth::HmacSessionVerifier;
use quiz_session_core::config::{Config, LoggingConfig, TimingConfig};
use quiz_session_core::gateway::{build_router, Gateway};
use quiz_session_core::store::InMemoryStore;

use test_helpers::{fast_timing, spawn_app};

fn bare_config() -> Config {
    Config {
        port: 0,
        database_url: String::new(),
        session_secret: "surface-test-secret".to_string(),
        logging: LoggingConfig {
            level: "error".to_string(),
            json: false,
        },
        timing: TimingConfig::default(),
    }
}

#[tokio::test]
async fn health_reports_ok_with_a_live_connection_count() {
    let store = Arc::new(InMemoryStore::new());
    let verifier = Arc::new(HmacSessionVerifier::new(b"surface-test-secret".to_vec()));
    let gateway = Gateway::new(bare_config(), store, verifier);
    let router = build_router(gateway, "*");

    let server = TestServer::new(router).expect("failed to build in-process test server");
    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn handshake_without_a_token_is_rejected() {
    let app = spawn_app(fast_timing(1)).await;
    let url = format!("ws://{}/ws", app.addr);
    let result = tokio_tungstenite::connect_async(&url).await;
    assert!(result.is_err(), "a missing token must not complete the handshake");
}

#[tokio::test]
async fn handshake_with_a_garbage_token_is_rejected() {
    let app = spawn_app(fast_timing(1)).await;
    let url = format!("ws://{}/ws?token=not-a-real-token", app.addr);
    let result = tokio_tungstenite::connect_async(&url).await;
    assert!(result.is_err(), "an invalid token must not complete the handshake");
}
