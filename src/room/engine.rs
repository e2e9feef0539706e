//! The quiz engine: one actor task per room, reached only through a
//! [`RoomHandle`]. Every command lands on the actor's `mpsc` channel and is
//! processed to completion before the next is read, so arrival order at
//! the per-room arbitration point falls out of plain FIFO queueing — no
//! locks, no compare-and-swap, just ordering.
//!
//! Internal timer fires (`StartFire`/`DeadlineFire`/`NextFire`) are sent
//! back to the same channel by spawned `tokio::time::sleep` tasks, so they
//! too are serialized against client commands instead of racing them.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::seq::SliceRandom;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::TimingConfig;
use crate::connection::ConnectionRegistry;
use crate::metrics::ServerMetrics;
use crate::protocol::{
    ChoiceIdx, ConnectionId, ParticipantView, QuestionIndex, RoomId, ServerMessage, StandingEntry, UserId,
};
use crate::store::{ClaimError, JoinError, QuizStore};

use super::error::RoomError;
use super::scoring;
use super::state::{Phase, QuestionRound, RoomState};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Snapshot handed back to a freshly joined connection so it can render
/// `joinedRoom` without a second round trip.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub participants: Vec<ParticipantView>,
    pub user_name: String,
}

enum RoomCommand {
    Join {
        user_id: UserId,
        reply: oneshot::Sender<Result<JoinOutcome, JoinError>>,
    },
    StartQuiz {
        user_id: UserId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    SubmitAnswer {
        user_id: UserId,
        question_index: QuestionIndex,
        choice_idx: ChoiceIdx,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        user_id: UserId,
        reply: Option<oneshot::Sender<()>>,
    },
    StartFire {
        epoch: u64,
    },
    DeadlineFire {
        epoch: u64,
        question_index: QuestionIndex,
    },
    NextFire {
        epoch: u64,
        question_index: QuestionIndex,
    },
    Shutdown,
}

/// A cheap, cloneable reference to a room's actor task. Every method is an
/// `async` round trip over the actor's command channel and a `oneshot`
/// reply — callers never touch [`RoomState`] directly.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
    dead_since: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub async fn join(&self, user_id: UserId) -> Result<JoinOutcome, JoinError> {
        let (reply, rx) = oneshot::channel();
        if self
            .sender
            .send(RoomCommand::Join { user_id, reply })
            .await
            .is_err()
        {
            return Err(JoinError::NotFound);
        }
        rx.await.unwrap_or(Err(JoinError::NotFound))
    }

    pub async fn start_quiz(&self, user_id: UserId) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send_engine_command(RoomCommand::StartQuiz { user_id, reply }, rx)
            .await
    }

    pub async fn submit_answer(
        &self,
        user_id: UserId,
        question_index: QuestionIndex,
        choice_idx: ChoiceIdx,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send_engine_command(
            RoomCommand::SubmitAnswer {
                user_id,
                question_index,
                choice_idx,
                reply,
            },
            rx,
        )
        .await
    }

    /// Fire-and-confirm: waits for the actor to process the departure so a
    /// caller can rely on the membership cache being updated before it does
    /// anything else (e.g. a test asserting the room died).
    pub async fn leave(&self, user_id: UserId) {
        let (reply, rx) = oneshot::channel();
        if self
            .sender
            .send(RoomCommand::Leave {
                user_id,
                reply: Some(reply),
            })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    async fn send_engine_command(
        &self,
        cmd: RoomCommand,
        rx: oneshot::Receiver<Result<(), RoomError>>,
    ) -> Result<(), RoomError> {
        if self.sender.send(cmd).await.is_err() {
            return Err(RoomError::RoomNotFound);
        }
        rx.await
            .unwrap_or_else(|_| Err(RoomError::Internal("room actor dropped reply".to_string())))
    }

    /// `None` while the room is alive; `Some(at)` once its engine reached
    /// `Dead`, for the registry's sweep.
    pub fn dead_since(&self) -> Option<DateTime<Utc>> {
        *self.dead_since.lock().expect("dead_since mutex poisoned")
    }

    /// Cancels every armed timer and stops the actor task. Best-effort;
    /// used by the registry's sweep and by graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.sender.try_send(RoomCommand::Shutdown);
    }
}

/// Spawns a fresh room actor, starting in `Phase::Lobby`, and returns a
/// handle to it. One call per room per process lifetime — see
/// [`super::registry::RoomRegistry::get_or_spawn`].
pub fn spawn(
    room_id: RoomId,
    store: Arc<dyn QuizStore>,
    connections: Arc<ConnectionRegistry>,
    timing: TimingConfig,
    metrics: Arc<ServerMetrics>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let dead_since = Arc::new(Mutex::new(None));
    metrics.room_spawned();

    let actor = RoomActor {
        room_id: room_id.clone(),
        state: RoomState::new(room_id.clone()),
        store,
        connections,
        timing,
        metrics,
        self_tx: tx.clone(),
        dead_since: dead_since.clone(),
    };
    tokio::spawn(actor.run(rx));

    RoomHandle {
        room_id,
        sender: tx,
        dead_since,
    }
}

fn chrono_duration(std_duration: std::time::Duration) -> ChronoDuration {
    ChronoDuration::from_std(std_duration).unwrap_or(ChronoDuration::zero())
}

struct RoomActor {
    room_id: RoomId,
    state: RoomState,
    store: Arc<dyn QuizStore>,
    connections: Arc<ConnectionRegistry>,
    timing: TimingConfig,
    metrics: Arc<ServerMetrics>,
    self_tx: mpsc::Sender<RoomCommand>,
    dead_since: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl RoomActor {
    async fn run(mut self, mut rx: mpsc::Receiver<RoomCommand>) {
        while let Some(cmd) = rx.recv().await {
            if matches!(cmd, RoomCommand::Shutdown) {
                self.state.cancel_active_timer();
                break;
            }
            self.handle(cmd).await;
        }
    }

    async fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { user_id, reply } => {
                let result = self.do_join(user_id).await;
                let _ = reply.send(result);
            }
            RoomCommand::StartQuiz { user_id, reply } => {
                let result = self.do_start_quiz(user_id).await;
                let _ = reply.send(result);
            }
            RoomCommand::SubmitAnswer {
                user_id,
                question_index,
                choice_idx,
                reply,
            } => {
                let result = self.do_submit_answer(user_id, question_index, choice_idx).await;
                let _ = reply.send(result);
            }
            RoomCommand::Leave { user_id, reply } => {
                self.do_leave(user_id).await;
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
            RoomCommand::StartFire { epoch } => self.do_start_fire(epoch).await,
            RoomCommand::DeadlineFire { epoch, question_index } => {
                self.do_deadline_fire(epoch, question_index).await
            }
            RoomCommand::NextFire { epoch, question_index } => {
                self.do_next_fire(epoch, question_index).await
            }
            RoomCommand::Shutdown => unreachable!("handled in run()"),
        }
    }

    /// Cancels whatever timer is armed and bumps the epoch, returning the
    /// new epoch for the caller to stamp onto whichever timer it arms next.
    fn begin_transition(&mut self) -> u64 {
        self.state.cancel_active_timer();
        self.state.epoch
    }

    /// One span per room phase transition, covering the broadcast and any
    /// persistence that follows it.
    fn transition_span(&self, phase: &str, question_index: Option<QuestionIndex>) -> tracing::Span {
        tracing::info_span!(
            "room_transition",
            room_id = %self.room_id,
            phase,
            question_index = question_index,
        )
    }

    /// Detaches every connection a broadcast reported as failed-to-write,
    /// and drops its user from this room the same way an explicit
    /// `leaveRoom` would. A full or closed outbound channel means that
    /// socket's write loop is already dying (or stuck) on its own, but
    /// this room's membership and the registry's bookkeeping should not
    /// wait for it to notice.
    async fn detach_failed(&mut self, failed: Vec<ConnectionId>) {
        for connection_id in failed {
            let user_id = self.connections.user_of(connection_id);
            self.connections.detach(connection_id).await;
            if let Some(user_id) = user_id {
                self.do_leave(user_id).await;
            }
        }
    }

    async fn do_join(&mut self, user_id: UserId) -> Result<JoinOutcome, JoinError> {
        let row = self.store.join_participant(user_id, &self.room_id).await?;
        let is_new = self.state.participants.insert(user_id);
        self.state
            .scoreboard
            .entry(user_id)
            .or_insert_with(|| (row.user_name.clone(), row.score));

        if self.state.host_user_id.is_none() {
            if let Ok(Some(room)) = self.store.get_room(&self.room_id).await {
                self.state.host_user_id = Some(room.host_user_id);
                self.state.max_players = Some(room.max_players);
            }
        }

        let participants = self
            .store
            .list_participants(&self.room_id)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|p| ParticipantView {
                user_id: p.user_id,
                user_name: p.user_name,
                score: p.score,
            })
            .collect();

        if is_new {
            let failed = self
                .connections
                .broadcast(
                    &self.room_id,
                    ServerMessage::ParticipantJoined {
                        room_id: self.room_id.clone(),
                        user_id,
                        user_name: row.user_name.clone(),
                    },
                )
                .await;
            self.detach_failed(failed).await;
        }

        Ok(JoinOutcome {
            participants,
            user_name: row.user_name,
        })
    }

    async fn do_leave(&mut self, user_id: UserId) {
        let was_tracked = self.state.participants.remove(&user_id);
        if let Err(err) = self.store.leave_participant(user_id, &self.room_id).await {
            tracing::error!(room_id = %self.room_id, user_id, error = %err, "failed to persist participant leave");
        }

        if was_tracked {
            let failed = self
                .connections
                .broadcast(
                    &self.room_id,
                    ServerMessage::ParticipantLeft {
                        room_id: self.room_id.clone(),
                        user_id,
                    },
                )
                .await;
            self.detach_failed(failed).await;
        }

        if self.state.participants.is_empty() && !matches!(self.state.phase, Phase::Dead) {
            let _guard = self.transition_span("dead", None).entered();
            self.enter_dead();
        }
    }

    async fn do_start_quiz(&mut self, user_id: UserId) -> Result<(), RoomError> {
        if !matches!(self.state.phase, Phase::Lobby) {
            return Err(RoomError::QuizAlreadyRunning);
        }

        let room = self
            .store
            .get_room(&self.room_id)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?
            .ok_or(RoomError::RoomNotFound)?;
        if !room.is_active {
            return Err(RoomError::RoomNotFound);
        }
        if room.host_user_id != user_id {
            return Err(RoomError::NotHost);
        }
        self.state.host_user_id = Some(room.host_user_id);
        self.state.max_players = Some(room.max_players);

        let limit = self.timing.questions_per_quiz as usize;
        let mut questions = self
            .store
            .fetch_questions(limit)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;
        if questions.len() < limit {
            return Err(RoomError::InsufficientQuestions);
        }
        // The bank is queried once; shuffling here (rather than relying on
        // the store's own ordering) keeps "deterministic but shuffled
        // sample" a property of the engine, not of whichever backend is
        // plugged in.
        questions.shuffle(&mut rand::rng());
        self.state.questions = questions;

        let epoch = self.begin_transition();
        self.state.phase = Phase::Starting;
        self.metrics.room_started();

        let span = self.transition_span("starting", None);
        async {
            let failed = self
                .connections
                .broadcast(
                    &self.room_id,
                    ServerMessage::QuizStarting {
                        room_id: self.room_id.clone(),
                        starts_at: Utc::now() + chrono_duration(self.timing.quiz_start_delay),
                    },
                )
                .await;
            self.detach_failed(failed).await;
            self.arm_start_timer(epoch);
        }
        .instrument(span)
        .await;
        Ok(())
    }

    async fn do_submit_answer(
        &mut self,
        user_id: UserId,
        question_index: QuestionIndex,
        choice_idx: ChoiceIdx,
    ) -> Result<(), RoomError> {
        if !self.state.participants.contains(&user_id) {
            return Err(RoomError::NotParticipant);
        }

        match self.state.phase {
            // The answer window already closed for this question; treat a
            // late arrival as a no-op rather than an error.
            Phase::Reveal(i) if i == question_index => return Ok(()),
            Phase::Asking(i) if i == question_index => {}
            _ => return Err(RoomError::QuestionNotActive),
        }

        let expires_at = match self.state.round.as_ref() {
            Some(round) => round.expires_at,
            None => return Err(RoomError::QuestionNotActive),
        };
        if Utc::now() >= expires_at {
            return Err(RoomError::QuestionExpired);
        }

        {
            let round = self.state.round.as_mut().expect("checked above");
            if round.answered.contains(&user_id) {
                return Ok(());
            }
            round.answered.insert(user_id);
        }

        let correct_idx = self.state.correct_idx(question_index).unwrap_or(ChoiceIdx::MAX);
        if choice_idx != correct_idx {
            return Ok(());
        }

        {
            let round = self.state.round.as_ref().expect("checked above");
            if round.first_correct.is_some() {
                // Single-consumer per room, so this should be unreachable;
                // kept as a belt-and-braces guard against future changes.
                return Ok(());
            }
        }
        self.state.round.as_mut().expect("checked above").first_correct = Some(user_id);
        if let Some(entry) = self.state.scoreboard.get_mut(&user_id) {
            entry.1 += 1;
        }

        let now = Utc::now();
        let tx_hash = scoring::synthetic_tx_hash(&self.room_id, question_index, user_id, now.timestamp_millis());
        match self
            .store
            .insert_claim(&self.room_id, question_index, user_id, &tx_hash)
            .await
        {
            Ok(()) => self.metrics.claim_recorded(),
            Err(ClaimError::Duplicate) => {
                tracing::warn!(room_id = %self.room_id, question_index, user_id, "duplicate claim rejected by store backstop");
            }
            Err(ClaimError::Store(err)) => {
                tracing::error!(room_id = %self.room_id, question_index, user_id, error = %err, "failed to persist winning claim");
            }
        }

        let epoch = self.begin_transition();
        self.state.phase = Phase::Reveal(question_index);

        let span = self.transition_span("reveal", Some(question_index));
        async {
            let failed = self
                .connections
                .broadcast(
                    &self.room_id,
                    ServerMessage::EndQuestion {
                        question_index,
                        correct_idx,
                        winner_user_id: Some(user_id),
                    },
                )
                .await;
            self.detach_failed(failed).await;
            self.arm_next_timer(epoch, question_index);
        }
        .instrument(span)
        .await;
        Ok(())
    }

    async fn do_start_fire(&mut self, epoch: u64) {
        if self.state.epoch != epoch || !matches!(self.state.phase, Phase::Starting) {
            return;
        }
        self.enter_asking(0).await;
    }

    async fn do_deadline_fire(&mut self, epoch: u64, question_index: QuestionIndex) {
        if self.state.epoch != epoch || self.state.phase != Phase::Asking(question_index) {
            return;
        }

        let correct_idx = self.state.correct_idx(question_index).unwrap_or(ChoiceIdx::MAX);
        if let Some(round) = self.state.round.as_mut() {
            round.expired = true;
        }

        let epoch = self.begin_transition();
        self.state.phase = Phase::Reveal(question_index);

        let span = self.transition_span("reveal", Some(question_index));
        async {
            let failed = self
                .connections
                .broadcast(
                    &self.room_id,
                    ServerMessage::EndQuestion {
                        question_index,
                        correct_idx,
                        winner_user_id: None,
                    },
                )
                .await;
            self.detach_failed(failed).await;
            self.arm_next_timer(epoch, question_index);
        }
        .instrument(span)
        .await;
    }

    async fn do_next_fire(&mut self, epoch: u64, question_index: QuestionIndex) {
        if self.state.epoch != epoch || self.state.phase != Phase::Reveal(question_index) {
            return;
        }

        let next = question_index + 1;
        if next >= self.timing.questions_per_quiz {
            self.finish_quiz().await;
        } else {
            self.enter_asking(next).await;
        }
    }

    async fn enter_asking(&mut self, index: QuestionIndex) {
        let epoch = self.begin_transition();
        let started_at = Utc::now();
        let time_limit = chrono_duration(self.timing.question_time_limit);
        self.state.round = Some(QuestionRound::new(started_at, time_limit));
        self.state.phase = Phase::Asking(index);

        let span = self.transition_span("asking", Some(index));
        async {
            if let Some(question) = self.state.current_question(index).cloned() {
                let expires_at = self
                    .state
                    .round
                    .as_ref()
                    .expect("just set above")
                    .expires_at;
                let failed = self
                    .connections
                    .broadcast(
                        &self.room_id,
                        ServerMessage::NextQuestion {
                            question_index: index,
                            question,
                            started_at,
                            expires_at,
                        },
                    )
                    .await;
                self.detach_failed(failed).await;
            }

            self.arm_deadline_timer(epoch, index);
        }
        .instrument(span)
        .await;
    }

    async fn finish_quiz(&mut self) {
        self.state.phase = Phase::Finished;
        let span = self.transition_span("finished", None);
        async {
            let standings = self.compute_standings().await;
            let failed = self
                .connections
                .broadcast(&self.room_id, ServerMessage::QuizFinished { standings })
                .await;
            self.detach_failed(failed).await;
            self.metrics.quiz_finished();
            self.enter_dead();
        }
        .instrument(span)
        .await;
    }

    /// Sourced from the room's own scoreboard, not `store.list_participants`:
    /// a player who dropped mid-quiz has already been deleted from the
    /// store's participant table by `leave_participant`, but their score up
    /// to that point must still appear in the final standings.
    async fn compute_standings(&self) -> Vec<StandingEntry> {
        let mut standings = Vec::with_capacity(self.state.scoreboard.len());
        for (&user_id, (user_name, score)) in &self.state.scoreboard {
            let prev_rating = self.store.get_rating(user_id).await.unwrap_or(1200);
            let new_rating = scoring::new_rating(prev_rating, *score);
            if let Err(err) = self.store.upsert_rating(user_id, new_rating).await {
                tracing::error!(room_id = %self.room_id, user_id, error = %err, "failed to persist rating");
            }
            standings.push(StandingEntry {
                user_id,
                user_name: user_name.clone(),
                score: *score,
                new_rating,
            });
        }
        scoring::sort_standings(standings)
    }

    /// Terminal for this process: once a room's engine reaches `Dead` it
    /// never restarts. A later join still succeeds at the membership-store
    /// layer, but no further quiz will run for this `roomId`.
    fn enter_dead(&mut self) {
        let was_running = !matches!(self.state.phase, Phase::Lobby | Phase::Dead);
        self.state.cancel_active_timer();
        self.state.phase = Phase::Dead;
        self.metrics.room_died(was_running);
        *self.dead_since.lock().expect("dead_since mutex poisoned") = Some(Utc::now());
    }

    fn arm_start_timer(&mut self, epoch: u64) {
        self.arm_timer(self.timing.quiz_start_delay, move |epoch| RoomCommand::StartFire { epoch }, epoch);
    }

    fn arm_deadline_timer(&mut self, epoch: u64, question_index: QuestionIndex) {
        self.arm_timer(
            self.timing.question_time_limit,
            move |epoch| RoomCommand::DeadlineFire { epoch, question_index },
            epoch,
        );
    }

    fn arm_next_timer(&mut self, epoch: u64, question_index: QuestionIndex) {
        self.arm_timer(
            self.timing.next_question_delay,
            move |epoch| RoomCommand::NextFire { epoch, question_index },
            epoch,
        );
    }

    fn arm_timer(
        &mut self,
        delay: std::time::Duration,
        make_cmd: impl FnOnce(u64) -> RoomCommand + Send + 'static,
        epoch: u64,
    ) {
        let tx = self.self_tx.clone();
        let handle: JoinHandle<()> = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(make_cmd(epoch)).await;
        });
        self.state.active_timer = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Question;
    use crate::store::{InMemoryStore, RoomRow, UserRow};
    use std::time::Duration;

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            question_time_limit: Duration::from_millis(30),
            quiz_start_delay: Duration::from_millis(10),
            next_question_delay: Duration::from_millis(10),
            questions_per_quiz: 2,
            max_connections_per_user: 3,
            rate_limit_window: Duration::from_secs(1),
            rate_limit_max: 10,
            cleanup_interval: Duration::from_secs(60),
            dead_room_retention: chrono::Duration::seconds(1800),
            shutdown_grace: Duration::from_secs(5),
        }
    }

    fn bank(count: i64) -> Vec<Question> {
        (0..count)
            .map(|i| Question {
                id: i,
                text: format!("q{i}"),
                options: [
                    "a".to_string(),
                    "b".to_string(),
                    "c".to_string(),
                    "d".to_string(),
                ],
                correct_idx: 0,
            })
            .collect()
    }

    fn test_store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store.seed_user(UserRow {
            user_id: 1,
            name: "host".to_string(),
            is_admin: false,
        });
        store.seed_user(UserRow {
            user_id: 2,
            name: "alice".to_string(),
            is_admin: false,
        });
        store.seed_room(RoomRow {
            room_id: "room-1".to_string(),
            host_user_id: 1,
            max_players: 8,
            is_active: true,
        });
        store.seed_questions(bank(4));
        Arc::new(store)
    }

    fn handle_for(store: Arc<InMemoryStore>) -> RoomHandle {
        let connections = Arc::new(ConnectionRegistry::new(
            3,
            Duration::from_secs(1),
            10,
            Arc::new(ServerMetrics::new()),
        ));
        spawn(
            "room-1".to_string(),
            store,
            connections,
            fast_timing(),
            Arc::new(ServerMetrics::new()),
        )
    }

    #[tokio::test]
    async fn join_succeeds_and_reports_user_name() {
        let handle = handle_for(test_store());
        let outcome = handle.join(1).await.unwrap();
        assert_eq!(outcome.user_name, "host");
    }

    #[tokio::test]
    async fn join_unknown_room_fails_not_found() {
        let store = InMemoryStore::new();
        let connections = Arc::new(ConnectionRegistry::new(
            3,
            Duration::from_secs(1),
            10,
            Arc::new(ServerMetrics::new()),
        ));
        let handle = spawn(
            "ghost".to_string(),
            Arc::new(store),
            connections,
            fast_timing(),
            Arc::new(ServerMetrics::new()),
        );
        assert_eq!(handle.join(1).await, Err(JoinError::NotFound));
    }

    #[tokio::test]
    async fn start_quiz_requires_host() {
        let handle = handle_for(test_store());
        handle.join(1).await.unwrap();
        handle.join(2).await.unwrap();
        assert_eq!(handle.start_quiz(2).await, Err(RoomError::NotHost));
    }

    #[tokio::test]
    async fn start_quiz_fails_without_enough_questions() {
        let store = InMemoryStore::new();
        store.seed_user(UserRow {
            user_id: 1,
            name: "host".to_string(),
            is_admin: false,
        });
        store.seed_room(RoomRow {
            room_id: "room-1".to_string(),
            host_user_id: 1,
            max_players: 8,
            is_active: true,
        });
        store.seed_questions(bank(1));
        let handle = handle_for(Arc::new(store));
        handle.join(1).await.unwrap();
        assert_eq!(
            handle.start_quiz(1).await,
            Err(RoomError::InsufficientQuestions)
        );
    }

    #[tokio::test]
    async fn submit_answer_rejects_non_participant() {
        let handle = handle_for(test_store());
        handle.join(1).await.unwrap();
        handle.start_quiz(1).await.unwrap();
        assert_eq!(
            handle.submit_answer(99, 0, 0).await,
            Err(RoomError::NotParticipant)
        );
    }

    #[tokio::test]
    async fn submit_answer_wrong_question_index_rejected() {
        let handle = handle_for(test_store());
        handle.join(1).await.unwrap();
        assert_eq!(
            handle.submit_answer(1, 5, 0).await,
            Err(RoomError::QuestionNotActive)
        );
    }

    #[tokio::test]
    async fn last_participant_leaving_kills_the_room() {
        let handle = handle_for(test_store());
        handle.join(1).await.unwrap();
        assert!(handle.dead_since().is_none());
        handle.leave(1).await;
        assert!(handle.dead_since().is_some());
    }
}
