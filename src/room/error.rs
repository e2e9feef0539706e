//! Typed failure modes for the quiz engine.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("room not found or inactive")]
    RoomNotFound,
    #[error("not a participant of this room")]
    NotParticipant,
    #[error("only the host may start the quiz")]
    NotHost,
    #[error("quiz is already running in this room")]
    QuizAlreadyRunning,
    #[error("question index does not match the active question")]
    QuestionNotActive,
    #[error("answer window for this question has closed")]
    QuestionExpired,
    #[error("question bank does not have enough questions for a quiz")]
    InsufficientQuestions,
    #[error("internal error: {0}")]
    Internal(String),
}
