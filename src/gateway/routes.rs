//! Router assembly: `/ws` for the push protocol, `/health` for process
//! liveness. CORS and request tracing are layered the same way the rest
//! of this codebase's HTTP surfaces are.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::websocket::websocket_handler;
use super::Gateway;

pub fn build_router(gateway: Arc<Gateway>, cors_origins: &str) -> Router {
    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|origin| origin.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("no valid CORS origins configured, falling back to permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    connections: usize,
}

async fn health_check(State(gateway): State<Arc<Gateway>>) -> Result<impl IntoResponse, StatusCode> {
    if !gateway.is_healthy().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(HealthBody {
        status: "ok",
        timestamp: chrono::Utc::now(),
        connections: gateway.connection_count(),
    }))
}
