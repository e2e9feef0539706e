//! Connection registry: tracks every live client session, enforces the
//! per-user connection cap and per-connection rate limit, and is the
//! sole fan-out primitive for broadcasting to a room.
//!
//! The registry owns connection lifetime exclusively; the quiz engine
//! never touches a socket directly, it only calls `Broadcast`/`Send`
//! here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{mpsc, watch, RwLock};

use super::rate_limit::SlidingWindowLimiter;
use crate::metrics::ServerMetrics;
use crate::protocol::{ConnectionId, RoomId, ServerMessage, UserId};

const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection limit reached for this user")]
    ConnectionLimit,
}

struct ConnectionEntry {
    user_id: UserId,
    room_id: Option<RoomId>,
    sender: mpsc::Sender<ServerMessage>,
    limiter: SlidingWindowLimiter,
    shutdown: watch::Sender<bool>,
}

/// A handle returned by `attach`; the connection's read loop holds this
/// for its lifetime and passes `id()` back into the registry for every
/// subsequent operation.
pub struct AttachedConnection {
    pub id: ConnectionId,
    pub receiver: mpsc::Receiver<ServerMessage>,
    /// Flips to `true` when `shutdown_all` is called; the socket's write
    /// loop watches this to send a `GoingAway` close frame instead of
    /// waiting for its outbound channel to close.
    pub shutdown: watch::Receiver<bool>,
}

pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
    per_user_counts: DashMap<UserId, usize>,
    room_members: RwLock<HashMap<RoomId, HashSet<ConnectionId>>>,
    max_connections_per_user: usize,
    rate_limit_window: Duration,
    rate_limit_max: u32,
    metrics: Arc<ServerMetrics>,
}

impl ConnectionRegistry {
    pub fn new(
        max_connections_per_user: usize,
        rate_limit_window: Duration,
        rate_limit_max: u32,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self {
            connections: DashMap::new(),
            per_user_counts: DashMap::new(),
            room_members: RwLock::new(HashMap::new()),
            max_connections_per_user,
            rate_limit_window,
            rate_limit_max,
            metrics,
        }
    }

    /// Registers a new live connection for `user_id`. Fails with
    /// `ConnectionLimit` once the user already holds
    /// `MAX_CONNECTIONS_PER_USER` connections.
    pub fn attach(&self, user_id: UserId) -> Result<AttachedConnection, RegistryError> {
        {
            let mut count = self.per_user_counts.entry(user_id).or_insert(0);
            if *count >= self.max_connections_per_user {
                return Err(RegistryError::ConnectionLimit);
            }
            *count += 1;
        }

        let (sender, receiver) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let id = uuid::Uuid::new_v4();
        self.connections.insert(
            id,
            ConnectionEntry {
                user_id,
                room_id: None,
                sender,
                limiter: SlidingWindowLimiter::new(),
                shutdown: shutdown_tx,
            },
        );
        self.metrics.connection_opened();

        Ok(AttachedConnection {
            id,
            receiver,
            shutdown: shutdown_rx,
        })
    }

    /// Idempotent. Returns the room the connection was attached to, if
    /// any, so the caller can run the membership-store leave and announce
    /// `participantLeft`.
    pub async fn detach(&self, id: ConnectionId) -> Option<RoomId> {
        let Some((_, entry)) = self.connections.remove(&id) else {
            return None;
        };

        if let Some(mut count) = self.per_user_counts.get_mut(&entry.user_id) {
            *count = count.saturating_sub(1);
        }
        self.metrics.connection_closed();

        if let Some(room_id) = &entry.room_id {
            let mut members = self.room_members.write().await;
            if let Some(set) = members.get_mut(room_id) {
                set.remove(&id);
                if set.is_empty() {
                    members.remove(room_id);
                }
            }
        }

        entry.room_id
    }

    pub async fn set_room(&self, id: ConnectionId, room_id: RoomId) {
        let previous = match self.connections.get_mut(&id) {
            Some(mut entry) => entry.room_id.replace(room_id.clone()),
            None => return,
        };

        let mut members = self.room_members.write().await;
        if let Some(previous) = previous.filter(|p| *p != room_id) {
            if let Some(set) = members.get_mut(&previous) {
                set.remove(&id);
                if set.is_empty() {
                    members.remove(&previous);
                }
            }
        }
        members.entry(room_id).or_default().insert(id);
    }

    /// Removes the connection from its current room's fan-out set without
    /// dropping the connection itself (`leaveRoom` keeps the socket open).
    /// Returns the room it was in, if any.
    pub async fn leave_room(&self, id: ConnectionId) -> Option<RoomId> {
        let previous = match self.connections.get_mut(&id) {
            Some(mut entry) => entry.room_id.take(),
            None => return None,
        };

        if let Some(room_id) = &previous {
            let mut members = self.room_members.write().await;
            if let Some(set) = members.get_mut(room_id) {
                set.remove(&id);
                if set.is_empty() {
                    members.remove(room_id);
                }
            }
        }

        previous
    }

    /// Count of currently attached connections, for `GET /health`.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn current_room(&self, id: ConnectionId) -> Option<RoomId> {
        self.connections.get(&id).and_then(|e| e.room_id.clone())
    }

    pub fn user_of(&self, id: ConnectionId) -> Option<UserId> {
        self.connections.get(&id).map(|e| e.user_id)
    }

    /// Single-target send. Best-effort: a full or closed channel is
    /// reported back so the caller can schedule a detach, but never
    /// blocks the caller waiting for a slow client to drain.
    pub fn send(&self, id: ConnectionId, message: ServerMessage) -> Result<(), ()> {
        match self.connections.get(&id) {
            Some(entry) => entry.sender.try_send(message).map_err(|_| ()),
            None => Err(()),
        }
    }

    /// Serializes once (by cloning the message to each channel — cloning a
    /// `ServerMessage` is cheap relative to a socket write) and sends to
    /// every connection currently attached to `room_id`. Connections whose
    /// channel is full or closed are collected and returned so the caller
    /// can run `Detach` on them without holding the fan-out lock open.
    pub async fn broadcast(&self, room_id: &RoomId, message: ServerMessage) -> Vec<ConnectionId> {
        let members = {
            let guard = self.room_members.read().await;
            guard.get(room_id).cloned().unwrap_or_default()
        };

        let mut failed = Vec::new();
        for id in members {
            if self.send(id, message.clone()).is_err() {
                failed.push(id);
            }
        }
        failed
    }

    /// Same as `broadcast` but skips one connection (used when the
    /// initiating client already has an authoritative response of its
    /// own, e.g. `joinedRoom` vs. `participantJoined`).
    pub async fn broadcast_except(
        &self,
        room_id: &RoomId,
        except: ConnectionId,
        message: ServerMessage,
    ) -> Vec<ConnectionId> {
        let members = {
            let guard = self.room_members.read().await;
            guard.get(room_id).cloned().unwrap_or_default()
        };

        let mut failed = Vec::new();
        for id in members {
            if id == except {
                continue;
            }
            if self.send(id, message.clone()).is_err() {
                failed.push(id);
            }
        }
        failed
    }

    /// Signals every currently-attached connection's write loop to send a
    /// `GoingAway` close frame and stop. Used once, at process shutdown.
    pub fn shutdown_all(&self) {
        for entry in self.connections.iter() {
            let _ = entry.shutdown.send(true);
        }
    }

    /// Checks and records one inbound frame against the connection's
    /// sliding window. Returns `false` if the frame must be dropped with a
    /// `RateLimited` error.
    pub fn check_rate_limit(&self, id: ConnectionId) -> bool {
        let Some(mut entry) = self.connections.get_mut(&id) else {
            return true;
        };
        let (window, max) = (self.rate_limit_window, self.rate_limit_max);
        entry
            .limiter
            .check_and_record(Instant::now(), window, max)
    }
}
