//! Bounds and shape validation for inbound payloads, kept separate from
//! decoding so rules can be adjusted (or tested in isolation) without
//! touching the serde representation.

use super::messages::ClientMessage;

pub const MAX_ROOM_ID_LEN: usize = 50;
pub const QUESTIONS_PER_QUIZ: u8 = 10;
pub const CHOICES_PER_QUESTION: u8 = 4;

pub fn validate_room_id(room_id: &str) -> Result<(), String> {
    if room_id.is_empty() {
        return Err("roomId must not be empty".to_string());
    }
    if room_id.len() > MAX_ROOM_ID_LEN {
        return Err(format!("roomId must be at most {MAX_ROOM_ID_LEN} chars"));
    }
    Ok(())
}

pub fn validate_question_index(index: u8) -> Result<(), String> {
    if index >= QUESTIONS_PER_QUIZ {
        return Err(format!(
            "questionIndex must be in [0,{}]",
            QUESTIONS_PER_QUIZ - 1
        ));
    }
    Ok(())
}

pub fn validate_choice_idx(choice: u8) -> Result<(), String> {
    if choice >= CHOICES_PER_QUESTION {
        return Err(format!(
            "choiceIdx must be in [0,{}]",
            CHOICES_PER_QUESTION - 1
        ));
    }
    Ok(())
}

pub fn validate_client_message(message: &ClientMessage) -> Result<(), String> {
    match message {
        ClientMessage::Join { room_id }
        | ClientMessage::StartQuiz { room_id }
        | ClientMessage::LeaveRoom { room_id } => validate_room_id(room_id),
        ClientMessage::SubmitAnswer {
            room_id,
            question_index,
            choice_idx,
        } => {
            validate_room_id(room_id)?;
            validate_question_index(*question_index)?;
            validate_choice_idx(*choice_idx)
        }
    }
}
