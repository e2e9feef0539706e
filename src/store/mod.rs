//! The relational store boundary: room/participant membership and
//! scoring/rating persistence.
//!
//! `QuizStore` is the trait every other component depends on; the quiz
//! engine never talks to Postgres directly. Two implementations ship:
//! [`memory::InMemoryStore`] (single-process, used by tests and as a
//! degenerate deployment) and [`postgres::PgStore`] (the reference
//! backend).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{Question, QuestionIndex, UserId};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRow {
    pub room_id: String,
    pub host_user_id: UserId,
    pub max_players: u8,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: UserId,
    pub name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub user_id: UserId,
    pub user_name: String,
    pub score: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    #[error("room not found")]
    NotFound,
    #[error("room is inactive")]
    Inactive,
    #[error("room is full")]
    Full,
    #[error("user is already in a different room")]
    AlreadyInOtherRoom,
}

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("a claim already exists for this room/question")]
    Duplicate,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authoritative room membership and scoring store. Every method that
/// mutates state runs inside a single
/// serializable transaction in the Postgres implementation; the
/// in-memory implementation achieves the same guarantee with a single
/// process-wide write lock, which is sufficient because it never spans
/// more than one process.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomRow>, StoreError>;

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserRow>, StoreError>;

    /// Checks the room exists/active/not full, checks the user is not
    /// already a participant of a *different* room, then upserts
    /// idempotently on `(roomId, userId)`.
    async fn join_participant(
        &self,
        user_id: UserId,
        room_id: &str,
    ) -> Result<ParticipantRow, JoinError>;

    /// Idempotent; a user who is not a participant is simply a no-op.
    async fn leave_participant(&self, user_id: UserId, room_id: &str) -> Result<(), StoreError>;

    async fn list_participants(&self, room_id: &str) -> Result<Vec<ParticipantRow>, StoreError>;

    /// Draws `limit` questions from the bank for a fresh quiz run. The
    /// order returned is not meaningful; the engine shuffles it.
    async fn fetch_questions(&self, limit: usize) -> Result<Vec<Question>, StoreError>;

    /// Records a winning claim and increments the claimer's score by one,
    /// atomically. The unique index on `(roomId, questionIndex)` is the
    /// durable backstop even if the in-memory check-and-set is ever
    /// bypassed by a bug.
    async fn insert_claim(
        &self,
        room_id: &str,
        question_index: QuestionIndex,
        user_id: UserId,
        tx_hash: &str,
    ) -> Result<(), ClaimError>;

    async fn get_rating(&self, user_id: UserId) -> Result<i64, StoreError>;

    async fn upsert_rating(&self, user_id: UserId, rating: i64) -> Result<(), StoreError>;

    /// Drains in-flight work and releases backend resources. Called once,
    /// during graceful shutdown, after every room actor has stopped
    /// issuing new queries. The in-memory store has nothing to release.
    async fn close(&self) {}
}
