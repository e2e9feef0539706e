//! Minimal in-process counters. Not a metrics export pipeline —
//! exporting to Prometheus or similar is out of scope here — but enough
//! to answer `GET /health` and to give an operator a coarse live view
//! via logs.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ServerMetrics {
    pub active_connections: AtomicI64,
    pub rooms_in_lobby: AtomicI64,
    pub rooms_running: AtomicI64,
    pub quizzes_finished: AtomicU64,
    pub claims_recorded: AtomicU64,
    pub rate_limited_frames: AtomicU64,
    pub errors_emitted: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn active_connections(&self) -> i64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn claim_recorded(&self) {
        self.claims_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn quiz_finished(&self) {
        self.quizzes_finished.fetch_add(1, Ordering::Relaxed);
    }

    /// A room actor was just spawned; it always starts in `Lobby`.
    pub fn room_spawned(&self) {
        self.rooms_in_lobby.fetch_add(1, Ordering::Relaxed);
    }

    /// `Lobby` → `Starting`: one fewer lobby, one more running quiz.
    pub fn room_started(&self) {
        self.rooms_in_lobby.fetch_sub(1, Ordering::Relaxed);
        self.rooms_running.fetch_add(1, Ordering::Relaxed);
    }

    /// A room's engine reached `Dead`. `was_running` distinguishes a quiz
    /// that was in progress from one that died while still in `Lobby`.
    pub fn room_died(&self, was_running: bool) {
        if was_running {
            self.rooms_running.fetch_sub(1, Ordering::Relaxed);
        } else {
            self.rooms_in_lobby.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn rate_limited(&self) {
        self.rate_limited_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error_emitted(&self) {
        self.errors_emitted.fetch_add(1, Ordering::Relaxed);
    }
}
