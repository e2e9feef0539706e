//! Single-process in-memory implementation of [`QuizStore`]. Used by the
//! test suite and available as a degenerate deployment backend. Mirrors
//! the lock-ordering discipline of the Postgres implementation: every
//! mutating operation takes its locks in a fixed order and performs the
//! check-then-write under them, so there is no TOCTOU gap equivalent to
//! what a `SERIALIZABLE` transaction buys the real backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{ClaimError, JoinError, ParticipantRow, QuizStore, RoomRow, StoreError, UserRow};
use crate::protocol::{Question, QuestionIndex, UserId};

#[derive(Default)]
pub struct InMemoryStore {
    rooms: RwLock<HashMap<String, RoomRow>>,
    users: RwLock<HashMap<UserId, UserRow>>,
    /// `(roomId, userId) -> participant`.
    participants: RwLock<HashMap<(String, UserId), ParticipantRow>>,
    /// The single room, if any, a user currently sits in (Participant
    /// entity invariant: at most one room per user).
    user_room: RwLock<HashMap<UserId, String>>,
    questions: RwLock<Vec<Question>>,
    /// `(roomId, questionIndex)` claims already recorded.
    claims: RwLock<std::collections::HashSet<(String, QuestionIndex)>>,
    ratings: RwLock<HashMap<UserId, i64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/seed helper standing in for the out-of-scope HTTP surface
    /// that actually creates rooms.
    pub fn seed_room(&self, room: RoomRow) {
        self.rooms.write().unwrap().insert(room.room_id.clone(), room);
    }

    pub fn seed_user(&self, user: UserRow) {
        self.users.write().unwrap().insert(user.user_id, user);
    }

    pub fn seed_questions(&self, questions: Vec<Question>) {
        *self.questions.write().unwrap() = questions;
    }

    pub fn deactivate_room(&self, room_id: &str) {
        if let Some(room) = self.rooms.write().unwrap().get_mut(room_id) {
            room.is_active = false;
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl QuizStore for InMemoryStore {
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomRow>, StoreError> {
        Ok(self.rooms.read().map_err(|_| poisoned())?.get(room_id).cloned())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserRow>, StoreError> {
        Ok(self.users.read().map_err(|_| poisoned())?.get(&user_id).cloned())
    }

    async fn join_participant(
        &self,
        user_id: UserId,
        room_id: &str,
    ) -> Result<ParticipantRow, JoinError> {
        let rooms = self.rooms.read().map_err(|_| JoinError::NotFound)?;
        let room = rooms.get(room_id).cloned().ok_or(JoinError::NotFound)?;
        drop(rooms);

        if !room.is_active {
            return Err(JoinError::Inactive);
        }

        let mut user_room = self.user_room.write().map_err(|_| JoinError::NotFound)?;
        let mut participants = self.participants.write().map_err(|_| JoinError::NotFound)?;

        if let Some(existing) = participants.get(&(room_id.to_string(), user_id)) {
            return Ok(existing.clone());
        }

        if let Some(other_room) = user_room.get(&user_id) {
            if other_room != room_id {
                return Err(JoinError::AlreadyInOtherRoom);
            }
        }

        let current_count = participants
            .keys()
            .filter(|(r, _)| r == room_id)
            .count();
        if current_count >= room.max_players as usize {
            return Err(JoinError::Full);
        }

        let user_name = self
            .users
            .read()
            .ok()
            .and_then(|users| users.get(&user_id).map(|u| u.name.clone()))
            .unwrap_or_else(|| format!("user-{user_id}"));

        let row = ParticipantRow {
            user_id,
            user_name,
            score: 0,
        };
        participants.insert((room_id.to_string(), user_id), row.clone());
        user_room.insert(user_id, room_id.to_string());

        Ok(row)
    }

    async fn leave_participant(&self, user_id: UserId, room_id: &str) -> Result<(), StoreError> {
        let mut participants = self.participants.write().map_err(|_| poisoned())?;
        participants.remove(&(room_id.to_string(), user_id));

        let mut user_room = self.user_room.write().map_err(|_| poisoned())?;
        if user_room.get(&user_id).map(|r| r.as_str()) == Some(room_id) {
            user_room.remove(&user_id);
        }

        Ok(())
    }

    async fn list_participants(&self, room_id: &str) -> Result<Vec<ParticipantRow>, StoreError> {
        let participants = self.participants.read().map_err(|_| poisoned())?;
        Ok(participants
            .iter()
            .filter(|((r, _), _)| r == room_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn fetch_questions(&self, limit: usize) -> Result<Vec<Question>, StoreError> {
        let questions = self.questions.read().map_err(|_| poisoned())?;
        Ok(questions.iter().take(limit).cloned().collect())
    }

    async fn insert_claim(
        &self,
        room_id: &str,
        question_index: QuestionIndex,
        user_id: UserId,
        _tx_hash: &str,
    ) -> Result<(), ClaimError> {
        let mut claims = self.claims.write().map_err(|_| poisoned())?;
        let key = (room_id.to_string(), question_index);
        if claims.contains(&key) {
            return Err(ClaimError::Duplicate);
        }

        let mut participants = self.participants.write().map_err(|_| poisoned())?;
        let participant = participants
            .get_mut(&(room_id.to_string(), user_id))
            .ok_or_else(|| ClaimError::Store(poisoned()))?;
        participant.score += 1;

        claims.insert(key);
        Ok(())
    }

    async fn get_rating(&self, user_id: UserId) -> Result<i64, StoreError> {
        Ok(self
            .ratings
            .read()
            .map_err(|_| poisoned())?
            .get(&user_id)
            .copied()
            .unwrap_or(1200))
    }

    async fn upsert_rating(&self, user_id: UserId, rating: i64) -> Result<(), StoreError> {
        self.ratings
            .write()
            .map_err(|_| poisoned())?
            .insert(user_id, rating);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_room(max_players: u8) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.seed_room(RoomRow {
            room_id: "room-1".to_string(),
            host_user_id: 1,
            max_players,
            is_active: true,
        });
        store.seed_user(UserRow {
            user_id: 1,
            name: "Host".to_string(),
            is_admin: false,
        });
        store
    }

    #[tokio::test]
    async fn join_unknown_room_fails_not_found() {
        let store = InMemoryStore::new();
        let result = store.join_participant(1, "ghost").await;
        assert_eq!(result.unwrap_err(), JoinError::NotFound);
    }

    #[tokio::test]
    async fn join_inactive_room_fails() {
        let store = store_with_room(5);
        store.deactivate_room("room-1");
        assert_eq!(
            store.join_participant(1, "room-1").await.unwrap_err(),
            JoinError::Inactive
        );
    }

    #[tokio::test]
    async fn rejoin_is_idempotent() {
        let store = store_with_room(5);
        store.join_participant(1, "room-1").await.unwrap();
        store.join_participant(1, "room-1").await.unwrap();
        assert_eq!(store.list_participants("room-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn full_room_rejects_extra_participant() {
        let store = store_with_room(1);
        store.join_participant(1, "room-1").await.unwrap();
        assert_eq!(
            store.join_participant(2, "room-1").await.unwrap_err(),
            JoinError::Full
        );
    }

    #[tokio::test]
    async fn user_cannot_join_two_rooms() {
        let store = store_with_room(5);
        store.seed_room(RoomRow {
            room_id: "room-2".to_string(),
            host_user_id: 1,
            max_players: 5,
            is_active: true,
        });
        store.join_participant(1, "room-1").await.unwrap();
        assert_eq!(
            store.join_participant(1, "room-2").await.unwrap_err(),
            JoinError::AlreadyInOtherRoom
        );
    }

    #[tokio::test]
    async fn duplicate_claim_is_rejected() {
        let store = store_with_room(5);
        store.join_participant(1, "room-1").await.unwrap();
        store.insert_claim("room-1", 0, 1, "tx1").await.unwrap();
        assert!(matches!(
            store.insert_claim("room-1", 0, 1, "tx2").await,
            Err(ClaimError::Duplicate)
        ));
        assert_eq!(
            store.list_participants("room-1").await.unwrap()[0].score,
            1
        );
    }

    #[tokio::test]
    async fn rating_defaults_to_1200() {
        let store = InMemoryStore::new();
        assert_eq!(store.get_rating(99).await.unwrap(), 1200);
    }
}
