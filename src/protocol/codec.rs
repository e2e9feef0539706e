//! Pure decode/encode layer. No I/O, no clock, no locks: every
//! function here is a plain data transform so it can be exhaustively
//! unit-tested without a running gateway.

use thiserror::Error;

use super::messages::{ClientMessage, ServerMessage};
use super::validation;
use crate::config::MAX_FRAME_BYTES;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame exceeds {max} bytes")]
    PayloadTooLarge { max: usize },
    #[error("malformed frame: {0}")]
    BadFrame(String),
    #[error("payload failed validation: {0}")]
    BadPayload(String),
}

/// Decode one inbound text frame, enforcing the size cap before attempting
/// to parse JSON (an oversized frame is rejected without ever being handed
/// to serde).
pub fn decode(raw: &str) -> Result<ClientMessage, ProtocolError> {
    if raw.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::PayloadTooLarge {
            max: MAX_FRAME_BYTES,
        });
    }

    let message: ClientMessage =
        serde_json::from_str(raw).map_err(|err| ProtocolError::BadFrame(err.to_string()))?;

    validation::validate_client_message(&message).map_err(ProtocolError::BadPayload)?;

    Ok(message)
}

/// Serialize an outbound message. Serialization of our own `ServerMessage`
/// enum cannot fail in practice (no maps with non-string keys, no floats
/// that could be NaN), so a failure here indicates a bug; callers log and
/// substitute a generic `Internal` error frame rather than panicking.
pub fn encode(message: &ServerMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(|err| ProtocolError::BadFrame(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_frame() {
        let huge_room_id = "x".repeat(MAX_FRAME_BYTES);
        let raw = format!(r#"{{"type":"join","payload":{{"roomId":"{huge_room_id}"}}}}"#);
        assert!(matches!(
            decode(&raw),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_bad_json() {
        assert!(matches!(decode("not json"), Err(ProtocolError::BadFrame(_))));
    }

    #[test]
    fn rejects_out_of_range_choice_idx() {
        let raw = r#"{"type":"submitAnswer","payload":{"roomId":"r","questionIndex":0,"choiceIdx":9}}"#;
        assert!(matches!(decode(raw), Err(ProtocolError::BadPayload(_))));
    }

    #[test]
    fn accepts_well_formed_frame() {
        let raw = r#"{"type":"join","payload":{"roomId":"room-1"}}"#;
        assert!(decode(raw).is_ok());
    }

    #[test]
    fn round_trips_next_question() {
        use super::super::types::Question;
        let msg = ServerMessage::NextQuestion {
            question_index: 2,
            question: Question {
                id: 1,
                text: "2+2?".into(),
                options: ["3".into(), "4".into(), "5".into(), "6".into()],
                correct_idx: 1,
            },
            started_at: chrono::Utc::now(),
            expires_at: chrono::Utc::now(),
        };
        let encoded = encode(&msg).unwrap();
        assert!(encoded.contains("\"nextQuestion\""));
    }
}
