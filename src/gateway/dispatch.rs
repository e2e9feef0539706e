//! Per-`ClientMessage`-variant dispatch. One method per inbound frame type,
//! flat and table-free, matching the router style the rest of the gateway
//! is grounded on (see `websocket.rs`'s doc comment).

use std::sync::Arc;

use tracing::Instrument;

use crate::protocol::{ChoiceIdx, ClientMessage, ConnectionId, ErrorCode, QuestionIndex, RoomId, ServerMessage, UserId};
use crate::room::RoomError;
use crate::store::JoinError;

use super::Gateway;

pub(super) async fn handle_client_message(
    gateway: &Arc<Gateway>,
    connection_id: ConnectionId,
    user_id: UserId,
    message: ClientMessage,
) {
    let span = tracing::info_span!(
        "inbound_frame",
        room_id = %message.room_id(),
        user_id,
        message_type = message.message_type(),
    );
    async move {
        match message {
            ClientMessage::Join { room_id } => handle_join(gateway, connection_id, user_id, room_id).await,
            ClientMessage::StartQuiz { room_id } => handle_start_quiz(gateway, connection_id, user_id, room_id).await,
            ClientMessage::SubmitAnswer {
                room_id,
                question_index,
                choice_idx,
            } => handle_submit_answer(gateway, connection_id, user_id, room_id, question_index, choice_idx).await,
            ClientMessage::LeaveRoom { room_id } => handle_leave_room(gateway, connection_id, user_id, room_id).await,
        }
    }
    .instrument(span)
    .await
}

async fn handle_join(gateway: &Arc<Gateway>, connection_id: ConnectionId, user_id: UserId, room_id: RoomId) {
    let handle = gateway.rooms.get_or_spawn(&room_id);
    match handle.join(user_id).await {
        Ok(outcome) => {
            gateway.connections.set_room(connection_id, room_id.clone()).await;
            let _ = gateway.connections.send(
                connection_id,
                ServerMessage::JoinedRoom {
                    room_id,
                    participants: outcome.participants,
                },
            );
        }
        Err(err) => emit_error(gateway, connection_id, join_error_code(err)),
    }
}

async fn handle_start_quiz(gateway: &Arc<Gateway>, connection_id: ConnectionId, user_id: UserId, room_id: RoomId) {
    let Some(handle) = gateway.rooms.get(&room_id) else {
        emit_error(gateway, connection_id, ErrorCode::RoomNotFound);
        return;
    };
    if let Err(err) = handle.start_quiz(user_id).await {
        emit_error(gateway, connection_id, room_error_code(err));
    }
}

async fn handle_submit_answer(
    gateway: &Arc<Gateway>,
    connection_id: ConnectionId,
    user_id: UserId,
    room_id: RoomId,
    question_index: QuestionIndex,
    choice_idx: ChoiceIdx,
) {
    let Some(handle) = gateway.rooms.get(&room_id) else {
        emit_error(gateway, connection_id, ErrorCode::RoomNotFound);
        return;
    };
    if let Err(err) = handle.submit_answer(user_id, question_index, choice_idx).await {
        emit_error(gateway, connection_id, room_error_code(err));
    }
}

async fn handle_leave_room(gateway: &Arc<Gateway>, connection_id: ConnectionId, user_id: UserId, room_id: RoomId) {
    if let Some(handle) = gateway.rooms.get(&room_id) {
        handle.leave(user_id).await;
    }
    gateway.connections.leave_room(connection_id).await;
}

fn emit_error(gateway: &Arc<Gateway>, connection_id: ConnectionId, code: ErrorCode) {
    gateway.metrics.error_emitted();
    let _ = gateway.connections.send(connection_id, ServerMessage::error(code));
}

fn join_error_code(err: JoinError) -> ErrorCode {
    match err {
        JoinError::NotFound | JoinError::Inactive => ErrorCode::RoomNotFound,
        JoinError::Full => ErrorCode::Full,
        JoinError::AlreadyInOtherRoom => ErrorCode::AlreadyInOtherRoom,
    }
}

fn room_error_code(err: RoomError) -> ErrorCode {
    match err {
        RoomError::RoomNotFound => ErrorCode::RoomNotFound,
        RoomError::NotParticipant => ErrorCode::NotParticipant,
        RoomError::NotHost => ErrorCode::NotHost,
        RoomError::QuizAlreadyRunning => ErrorCode::QuizAlreadyRunning,
        RoomError::QuestionNotActive => ErrorCode::QuestionNotActive,
        RoomError::QuestionExpired => ErrorCode::QuestionExpired,
        RoomError::InsufficientQuestions => ErrorCode::InsufficientQuestions,
        RoomError::Internal(_) => ErrorCode::Internal,
    }
}
