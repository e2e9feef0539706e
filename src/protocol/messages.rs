//! Wire message shapes for the quiz push protocol.
//!
//! Every frame on the wire is `{"type": <string>, "payload": <object>}`.
//! `ClientMessage` and `ServerMessage` model the inbound and outbound halves
//! respectively; serde's internally-tagged enum representation gives us the
//! exact `type`/`payload` split for free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error_codes::ErrorCode;
use super::types::{ChoiceIdx, Question, QuestionIndex, StandingEntry, UserId};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join { #[serde(rename = "roomId")] room_id: String },

    #[serde(rename = "startQuiz")]
    StartQuiz { #[serde(rename = "roomId")] room_id: String },

    #[serde(rename = "submitAnswer")]
    SubmitAnswer {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "questionIndex")]
        question_index: QuestionIndex,
        #[serde(rename = "choiceIdx")]
        choice_idx: ChoiceIdx,
    },

    #[serde(rename = "leaveRoom")]
    LeaveRoom { #[serde(rename = "roomId")] room_id: String },
}

impl ClientMessage {
    /// The room a given inbound message targets; every variant carries one.
    pub fn room_id(&self) -> &str {
        match self {
            Self::Join { room_id }
            | Self::StartQuiz { room_id }
            | Self::SubmitAnswer { room_id, .. }
            | Self::LeaveRoom { room_id } => room_id,
        }
    }

    /// The wire `type` tag, for attaching to log spans without re-deriving
    /// it from the serde representation.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::StartQuiz { .. } => "startQuiz",
            Self::SubmitAnswer { .. } => "submitAnswer",
            Self::LeaveRoom { .. } => "leaveRoom",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected { #[serde(rename = "userId")] user_id: UserId },

    #[serde(rename = "joinedRoom")]
    JoinedRoom {
        #[serde(rename = "roomId")]
        room_id: String,
        participants: Vec<ParticipantView>,
    },

    #[serde(rename = "participantJoined")]
    ParticipantJoined {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: UserId,
        #[serde(rename = "userName")]
        user_name: String,
    },

    #[serde(rename = "participantLeft")]
    ParticipantLeft {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: UserId,
    },

    #[serde(rename = "quizStarting")]
    QuizStarting {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "startsAt")]
        starts_at: DateTime<Utc>,
    },

    #[serde(rename = "nextQuestion")]
    NextQuestion {
        #[serde(rename = "questionIndex")]
        question_index: QuestionIndex,
        question: Question,
        #[serde(rename = "startedAt")]
        started_at: DateTime<Utc>,
        #[serde(rename = "expiresAt")]
        expires_at: DateTime<Utc>,
    },

    #[serde(rename = "endQuestion")]
    EndQuestion {
        #[serde(rename = "questionIndex")]
        question_index: QuestionIndex,
        #[serde(rename = "correctIdx")]
        correct_idx: ChoiceIdx,
        #[serde(rename = "winnerUserId")]
        winner_user_id: Option<UserId>,
    },

    #[serde(rename = "quizFinished")]
    QuizFinished { standings: Vec<StandingEntry> },

    #[serde(rename = "error")]
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    pub fn error(code: ErrorCode) -> Self {
        Self::Error {
            code,
            message: code.message().to_string(),
        }
    }
}

/// A participant as rendered in a `joinedRoom` snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantView {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_join() {
        let raw = r#"{"type":"join","payload":{"roomId":"abc"}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                room_id: "abc".to_string()
            }
        );
    }

    #[test]
    fn decodes_submit_answer() {
        let raw =
            r#"{"type":"submitAnswer","payload":{"roomId":"abc","questionIndex":3,"choiceIdx":1}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SubmitAnswer {
                room_id: "abc".to_string(),
                question_index: 3,
                choice_idx: 1,
            }
        );
    }

    #[test]
    fn encodes_end_question_with_null_winner() {
        let msg = ServerMessage::EndQuestion {
            question_index: 0,
            correct_idx: 2,
            winner_user_id: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "endQuestion");
        assert!(json["payload"]["winnerUserId"].is_null());
    }

    #[test]
    fn encodes_error_with_numeric_code() {
        let msg = ServerMessage::error(ErrorCode::RoomNotFound);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"]["code"], 404);
    }

    #[test]
    fn rejects_unknown_type() {
        let raw = r#"{"type":"bogus","payload":{}}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
