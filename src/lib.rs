#![cfg_attr(not(test), deny(clippy::panic))]

//! # Quiz Session Core
//!
//! The push-protocol gateway and state machine for a single multiplayer
//! trivia quiz session: session authentication, connection lifecycle, the
//! quiz engine's phase state machine, and durable scoring/ratings. The
//! external platform owns accounts, room creation, and billing; this
//! crate owns everything that happens once a client opens a WebSocket.

/// Session authentication: translates opaque bearer tokens into user identities.
pub mod auth;

/// Layered configuration: environment-sourced, typed, built once at boot.
pub mod config;

/// Connection registry: per-connection lifecycle, rate limiting, broadcast fan-out.
pub mod connection;

/// The WebSocket gateway: upgrade handling, command dispatch, process lifecycle.
pub mod gateway;

/// Structured logging bootstrap.
pub mod logging;

/// In-process counters.
pub mod metrics;

/// Wire protocol: message shapes, codec, error codes, validation.
pub mod protocol;

/// The quiz engine: per-room actor, phase state machine, scoring arithmetic.
pub mod room;

/// The relational store boundary: room/participant membership and durable ratings.
pub mod store;
