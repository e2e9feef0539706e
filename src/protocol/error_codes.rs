use serde::Serialize;
use std::fmt;

/// Stable numeric error categories surfaced to clients in an `error` frame.
///
/// The numeric value is part of the wire contract (see `{code, message}` in
/// the `error` payload) and must not be renumbered once shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadFrame,
    BadPayload,
    Unauthenticated,
    NotParticipant,
    NotHost,
    RoomNotFound,
    QuizAlreadyRunning,
    QuestionNotActive,
    Full,
    AlreadyInOtherRoom,
    InsufficientQuestions,
    QuestionExpired,
    PayloadTooLarge,
    ConnectionLimit,
    RateLimited,
    Internal,
}

impl ErrorCode {
    /// Numeric category sent on the wire. Several variants intentionally
    /// share a category (e.g. `NotHost` and `NotParticipant` both surface
    /// as 403); `message` is what tells them apart.
    pub fn code(self) -> u16 {
        match self {
            Self::BadFrame | Self::BadPayload => 400,
            Self::Unauthenticated => 401,
            Self::NotParticipant | Self::NotHost => 403,
            Self::RoomNotFound => 404,
            Self::QuizAlreadyRunning
            | Self::QuestionNotActive
            | Self::Full
            | Self::AlreadyInOtherRoom
            | Self::InsufficientQuestions => 409,
            Self::QuestionExpired => 410,
            Self::PayloadTooLarge => 413,
            Self::ConnectionLimit | Self::RateLimited => 429,
            Self::Internal => 500,
        }
    }

    /// Human-readable message sent alongside the numeric code. Distinct
    /// error codes may share a numeric category (e.g. `NotHost` and
    /// `NotParticipant` both surface as 403) but always carry a distinct
    /// message so clients can branch on text if they need finer detail.
    pub fn message(self) -> &'static str {
        match self {
            Self::BadFrame => "malformed frame",
            Self::BadPayload => "payload failed validation",
            Self::Unauthenticated => "missing or invalid session token",
            Self::NotParticipant => "not a participant of this room",
            Self::NotHost => "only the host may start the quiz",
            Self::RoomNotFound => "room not found or inactive",
            Self::QuizAlreadyRunning => "quiz is already running in this room",
            Self::QuestionNotActive => "question index does not match the active question",
            Self::Full => "room is full",
            Self::AlreadyInOtherRoom => "user is already in a different room",
            Self::InsufficientQuestions => "question bank does not have enough questions",
            Self::QuestionExpired => "answer window for this question has closed",
            Self::PayloadTooLarge => "frame exceeds the maximum allowed size",
            Self::ConnectionLimit => "too many concurrent connections for this user",
            Self::RateLimited => "too many messages in a short time",
            Self::Internal => "internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_spec_table() {
        assert_eq!(ErrorCode::BadFrame.code(), 400);
        assert_eq!(ErrorCode::Unauthenticated.code(), 401);
        assert_eq!(ErrorCode::NotHost.code(), 403);
        assert_eq!(ErrorCode::RoomNotFound.code(), 404);
        assert_eq!(ErrorCode::QuestionNotActive.code(), 409);
        assert_eq!(ErrorCode::Full.code(), 409);
        assert_eq!(ErrorCode::AlreadyInOtherRoom.code(), 409);
        assert_eq!(ErrorCode::InsufficientQuestions.code(), 409);
        assert_eq!(ErrorCode::QuestionExpired.code(), 410);
        assert_eq!(ErrorCode::PayloadTooLarge.code(), 413);
        assert_eq!(ErrorCode::RateLimited.code(), 429);
        assert_eq!(ErrorCode::Internal.code(), 500);
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&ErrorCode::RoomNotFound).unwrap();
        assert_eq!(json, "404");
    }
}
