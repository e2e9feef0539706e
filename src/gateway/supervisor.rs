//! Process lifecycle: a periodic sweep of dead rooms and graceful
//! shutdown on `SIGINT`/`SIGTERM`.

use std::sync::Arc;

use super::Gateway;

/// Runs forever, sweeping dead rooms every `cleanup_interval`. Intended to
/// be spawned once at boot and raced against the HTTP server's own future
/// so either one's exit ends the process.
pub async fn run_supervisor(gateway: Arc<Gateway>) {
    let mut interval = tokio::time::interval(gateway.config.timing.cleanup_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let before = gateway.rooms.room_count();
        gateway
            .rooms
            .sweep_dead(gateway.config.timing.dead_room_retention);
        let swept = before.saturating_sub(gateway.rooms.room_count());

        if swept > 0 {
            tracing::info!(swept, "cleanup sweep removed dead rooms");
        }
    }
}

/// Resolves once an operator asks the process to stop, via `SIGINT`
/// (ctrl-c) or, on unix, `SIGTERM`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Cancels every live room actor's timers before the process exits, so no
/// orphaned `tokio::time::sleep` task outlives the gateway.
pub fn shutdown_gateway(gateway: &Arc<Gateway>) {
    tracing::info!("shutting down: cancelling all room timers");
    gateway.rooms.shutdown_all();
}
