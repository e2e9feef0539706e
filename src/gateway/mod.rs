//! The gateway: the WebSocket upgrade surface, per-connection read
//! loop, command dispatch, and process lifecycle (startup, periodic
//! cleanup sweep, graceful shutdown) that sit in front of the quiz engine.

mod dispatch;
mod routes;
mod supervisor;
mod websocket;

pub use routes::build_router;
pub use supervisor::{run_supervisor, shutdown_gateway, shutdown_signal};

use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::config::Config;
use crate::connection::ConnectionRegistry;
use crate::metrics::ServerMetrics;
use crate::room::RoomRegistry;
use crate::store::QuizStore;

/// Every collaborator the gateway needs, held as an owned `Arc` rather
/// than reached for as a global, the same injection discipline the
/// store and auth layers use.
pub struct Gateway {
    pub config: Config,
    pub store: Arc<dyn QuizStore>,
    pub verifier: Arc<dyn SessionVerifier>,
    pub connections: Arc<ConnectionRegistry>,
    pub rooms: Arc<RoomRegistry>,
    pub metrics: Arc<ServerMetrics>,
}

impl Gateway {
    pub fn new(
        config: Config,
        store: Arc<dyn QuizStore>,
        verifier: Arc<dyn SessionVerifier>,
    ) -> Arc<Self> {
        let metrics = Arc::new(ServerMetrics::new());
        let connections = Arc::new(ConnectionRegistry::new(
            config.timing.max_connections_per_user,
            config.timing.rate_limit_window,
            config.timing.rate_limit_max,
            metrics.clone(),
        ));
        let rooms = Arc::new(RoomRegistry::new(
            store.clone(),
            connections.clone(),
            config.timing,
            metrics.clone(),
        ));

        Arc::new(Self {
            config,
            store,
            verifier,
            connections,
            rooms,
            metrics,
        })
    }

    /// Backing for `GET /health`: the process is healthy if its store
    /// connection still answers. `user_id` 0 never exists, so this is a
    /// pure round trip, not a real lookup.
    pub async fn is_healthy(&self) -> bool {
        self.store.get_user(0).await.is_ok()
    }

    /// Count of currently attached connections, for the health payload.
    pub fn connection_count(&self) -> usize {
        self.connections.connection_count()
    }
}
