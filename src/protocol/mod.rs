//! Wire protocol: message shapes, the pure decode/encode codec, error
//! codes, and inbound payload validation.

pub mod codec;
pub mod error_codes;
pub mod messages;
pub mod types;
pub mod validation;

pub use codec::{decode, encode, ProtocolError};
pub use error_codes::ErrorCode;
pub use messages::{ClientMessage, ParticipantView, ServerMessage};
pub use types::{ChoiceIdx, ConnectionId, Question, QuestionIndex, RoomId, StandingEntry, UserId};
