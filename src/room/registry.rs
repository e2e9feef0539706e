//! `RoomRegistry`: the single map from `roomId` to a live room actor.
//! Collapses what a naive implementation might spread across several
//! sockets/timers/rooms maps into one `DashMap`.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::config::TimingConfig;
use crate::connection::ConnectionRegistry;
use crate::metrics::ServerMetrics;
use crate::protocol::RoomId;
use crate::store::QuizStore;

use super::engine::{self, RoomHandle};

pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
    store: Arc<dyn QuizStore>,
    connections: Arc<ConnectionRegistry>,
    timing: TimingConfig,
    metrics: Arc<ServerMetrics>,
}

impl RoomRegistry {
    pub fn new(
        store: Arc<dyn QuizStore>,
        connections: Arc<ConnectionRegistry>,
        timing: TimingConfig,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self {
            rooms: DashMap::new(),
            store,
            connections,
            timing,
            metrics,
        }
    }

    /// Returns the room's actor handle, spawning a fresh one (starting in
    /// `Lobby`) the first time this process sees `room_id`. `DashMap`'s
    /// per-shard lock inside `or_insert_with` keeps two concurrent callers
    /// from racing to spawn duplicate actors for the same room.
    pub fn get_or_spawn(&self, room_id: &str) -> RoomHandle {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                engine::spawn(
                    room_id.to_string(),
                    self.store.clone(),
                    self.connections.clone(),
                    self.timing,
                    self.metrics.clone(),
                )
            })
            .clone()
    }

    pub fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.clone())
    }

    /// Periodic sweep: drops any room whose engine has sat in
    /// `Dead` for longer than `retention`, so long-lived processes don't
    /// accumulate one actor task per ever-played room.
    pub fn sweep_dead(&self, retention: chrono::Duration) {
        let now = Utc::now();
        let stale: Vec<RoomId> = self
            .rooms
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .dead_since()
                    .filter(|died_at| now - *died_at > retention)
                    .map(|_| entry.key().clone())
            })
            .collect();

        for room_id in stale {
            if let Some((_, handle)) = self.rooms.remove(&room_id) {
                handle.shutdown();
            }
        }
    }

    /// Tells every live room actor to cancel its timers and stop, as part
    /// of graceful process shutdown.
    pub fn shutdown_all(&self) {
        for entry in self.rooms.iter() {
            entry.value().shutdown();
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
