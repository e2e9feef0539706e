//! Transient per-room state and the `Phase` state machine. Nothing
//! outside [`crate::room::engine`] ever sees a `&mut RoomState` — every
//! mutation happens on the room's single-consumer actor task, so there is
//! no lock here at all, just plain owned data.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::protocol::{ChoiceIdx, Question, QuestionIndex, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Starting,
    Asking(QuestionIndex),
    Reveal(QuestionIndex),
    Finished,
    Dead,
}

/// State scoped to whichever question is currently being asked.
#[derive(Debug, Clone)]
pub struct QuestionRound {
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub answered: HashSet<UserId>,
    pub first_correct: Option<UserId>,
    pub expired: bool,
}

impl QuestionRound {
    pub fn new(started_at: DateTime<Utc>, time_limit: chrono::Duration) -> Self {
        Self {
            started_at,
            expires_at: started_at + time_limit,
            answered: HashSet::new(),
            first_correct: None,
            expired: false,
        }
    }
}

pub struct RoomState {
    pub room_id: String,
    pub phase: Phase,
    pub questions: Vec<Question>,
    pub round: Option<QuestionRound>,
    /// Cache of the room's current participant set, kept in sync with the
    /// membership store on join/leave so `submitAnswer`'s hot path never
    /// needs a store round trip just to check `NotParticipant`.
    pub participants: HashSet<UserId>,
    /// `(userName, score)` for every user who has ever joined this room,
    /// keyed by `UserId`. Unlike `participants` and the store's own
    /// participant row, an entry here survives a mid-quiz `leave` — final
    /// standings must still credit a departed player's score (a dropped
    /// host forfeits the rest of the quiz, not the points already won).
    pub scoreboard: HashMap<UserId, (String, i64)>,
    /// Cached host identity, populated from the store the first time a
    /// command needs it (`startQuiz`'s `NotHost` check). `None` until then.
    pub host_user_id: Option<UserId>,
    pub max_players: Option<u8>,
    /// Bumped on every phase transition into `Asking`/`Reveal`. Timer
    /// futures capture the epoch in force when they are armed; a fired
    /// timer whose epoch no longer matches `self.epoch` is stale and is a
    /// no-op. Actually cancelling the `JoinHandle` is best-effort, this
    /// epoch check is the correctness backstop.
    pub epoch: u64,
    /// Handle to whichever timer (deadline or next-question) is currently
    /// armed, so a winning claim can cancel the deadline timer outright
    /// instead of relying solely on the epoch check.
    pub active_timer: Option<JoinHandle<()>>,
}

impl RoomState {
    pub fn new(room_id: String) -> Self {
        Self {
            room_id,
            phase: Phase::Lobby,
            questions: Vec::new(),
            round: None,
            participants: HashSet::new(),
            scoreboard: HashMap::new(),
            host_user_id: None,
            max_players: None,
            epoch: 0,
            active_timer: None,
        }
    }

    pub fn current_question(&self, index: QuestionIndex) -> Option<&Question> {
        self.questions.get(index as usize)
    }

    pub fn correct_idx(&self, index: QuestionIndex) -> Option<ChoiceIdx> {
        self.current_question(index).map(|q| q.correct_idx)
    }

    /// Aborts and clears whatever timer is currently armed, then bumps the
    /// epoch so any fire already in flight is recognized as stale.
    pub fn cancel_active_timer(&mut self) {
        if let Some(handle) = self.active_timer.take() {
            handle.abort();
        }
        self.epoch += 1;
    }
}
