//! Core identifier and index types shared across the gateway.

use serde::{Deserialize, Serialize};

/// Durable identity of a signed-up user. Assigned by the external HTTP
/// surface at signup time; the core only ever reads it.
pub type UserId = i64;

/// Opaque room identifier minted by the external HTTP surface at room
/// creation time. Treated as an opaque string throughout the core.
pub type RoomId = String;

/// Position of a question within a single quiz run, `0..QUESTIONS_PER_QUIZ`.
pub type QuestionIndex = u8;

/// Index of an answer option within a question's four choices, `0..4`.
pub type ChoiceIdx = u8;

/// Opaque connection identifier assigned by the connection registry at
/// attach time. Never observed by clients.
pub type ConnectionId = uuid::Uuid;

/// A single question as read from the question bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub options: [String; 4],
    #[serde(rename = "correctIdx")]
    pub correct_idx: ChoiceIdx,
}

/// One row of the final standings table emitted in `quizFinished`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandingEntry {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub score: i64,
    #[serde(rename = "newRating")]
    pub new_rating: i64,
}
