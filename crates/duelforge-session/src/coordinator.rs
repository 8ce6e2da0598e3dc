//! The session coordinator: session creation, move dispatch, state
//! broadcast, and teardown.
//!
//! Every method takes `&mut self` and runs to completion; there is no
//! locking anywhere in here. Concurrency is the runtime's problem: it owns
//! the coordinator inside a single task and feeds it one event at a time
//! (see [`spawn_coordinator`](crate::spawn_coordinator)).

use duelforge_engine::{EngineRegistry, MoveOutcome, Seat, Snapshot};
use duelforge_protocol::{GameType, PlayerId, ServerMessage, SessionId};
use serde_json::Value;

use crate::teardown::{TeardownReceiver, TeardownScheduler};
use crate::{
    CoordinatorConfig, CoordinatorError, Participant, Rejected, SeatedParticipant, Session,
    SessionDraft, SessionPhase, SessionRegistry,
};

/// Owns the session registry, the engine registry, and the pending
/// teardown timers.
#[derive(Debug)]
pub struct Coordinator {
    registry: SessionRegistry,
    engines: EngineRegistry,
    teardown: TeardownScheduler,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Creates a coordinator and the channel its teardown timers fire on.
    ///
    /// Whoever drives the coordinator must pass every id received on the
    /// returned channel to [`expire`](Self::expire).
    pub fn new(config: CoordinatorConfig, engines: EngineRegistry) -> (Self, TeardownReceiver) {
        let (teardown, expiries) = TeardownScheduler::new(config.teardown_grace());
        let coordinator = Self {
            registry: SessionRegistry::new(),
            engines,
            teardown,
            config,
        };
        (coordinator, expiries)
    }

    // -----------------------------------------------------------------
    // createSession
    // -----------------------------------------------------------------

    /// Creates a session for `a` (seat A) and `b` (seat B).
    ///
    /// On success both participants receive `sessionFound` followed by the
    /// initial `gameState`. On failure nothing is sent and no state
    /// changes.
    pub fn create_session(
        &mut self,
        a: Participant,
        b: Participant,
        game_type: &GameType,
    ) -> Result<SessionId, CoordinatorError> {
        if a.id == b.id {
            return Err(CoordinatorError::SameParticipant(a.id));
        }
        for p in [&a, &b] {
            if !p.is_connected() {
                return Err(CoordinatorError::ParticipantGone(p.id));
            }
            if self.registry.is_active(&p.id) {
                return Err(CoordinatorError::AlreadyInSession(p.id));
            }
        }
        let mut engine = self
            .engines
            .instantiate(game_type)
            .ok_or_else(|| CoordinatorError::UnknownGameType(game_type.clone()))?;

        let [role_a, role_b] = engine.initialize([a.id, b.id]);
        let opening = engine.opening_seat();
        let board_shape = engine.board_shape();

        let draft = SessionDraft {
            game_type: game_type.clone(),
            engine,
            seats: [
                SeatedParticipant { participant: a, role: role_a },
                SeatedParticipant { participant: b, role: role_b },
            ],
        };
        let id = match self.registry.register(draft) {
            Ok(id) => id,
            Err(Rejected { error, draft }) => {
                draft.discard();
                return Err(error);
            }
        };

        if let Some(session) = self.registry.get(&id) {
            announce(session, opening, board_shape);
        }
        self.broadcast_state(&id);
        Ok(id)
    }

    // -----------------------------------------------------------------
    // handleMove
    // -----------------------------------------------------------------

    /// Routes a move to the mover's session.
    ///
    /// A participant without a session is ignored: late moves after a
    /// teardown are expected.
    pub fn handle_move(&mut self, player: PlayerId, data: &Value) {
        let Some(id) = self.registry.session_of(&player).cloned() else {
            tracing::debug!(player_id = %player, "move from player without a session");
            return;
        };
        let Some(session) = self.registry.get_mut(&id) else {
            return;
        };

        match session.engine_mut().apply_move(player, data) {
            MoveOutcome::Accepted => {
                tracing::debug!(session_id = %id, player_id = %player, "move accepted");
                self.broadcast_state(&id);
            }
            MoveOutcome::Rejected(reason) => {
                tracing::debug!(session_id = %id, player_id = %player, %reason, "move rejected");
                if let Some(seat) = session.seat_of(player) {
                    session.seat(seat).notify(&ServerMessage::MoveError {
                        reason: reason.to_string(),
                    });
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // broadcastState
    // -----------------------------------------------------------------

    /// Sends the same `gameState` to both participants. A terminal state
    /// moves the session to `TerminalPending` and starts the grace timer.
    pub fn broadcast_state(&mut self, id: &SessionId) {
        let Some(session) = self.registry.get_mut(id) else {
            tracing::debug!(session_id = %id, "broadcast for a session that is gone");
            return;
        };

        let snapshot = session.engine().snapshot();
        let is_terminal = session.engine().is_terminal();
        let [seat_a, seat_b] = session.seats();
        let msg = ServerMessage::GameState {
            session_id: id.clone(),
            board: snapshot.board,
            current_turn: snapshot.current_turn,
            winner: snapshot.winner,
            is_draw: snapshot.is_draw,
            is_terminal,
            participant_a_role: seat_a.role.clone(),
            participant_b_role: seat_b.role.clone(),
            game_type: session.game_type().clone(),
        };
        for seat in session.seats() {
            seat.notify(&msg);
        }

        if is_terminal && session.phase() == SessionPhase::Active {
            session.advance(SessionPhase::TerminalPending);
            self.teardown.schedule(id.clone());
            tracing::info!(session_id = %id, "session reached a terminal state");
        }
    }

    // -----------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------

    /// Ends a session: cancels its timer, removes it from the registry,
    /// and releases its engine.
    ///
    /// Idempotent. Returns `false` if the session was already gone.
    pub fn end_session(&mut self, id: &SessionId) -> bool {
        self.teardown.cancel(id);
        match self.registry.remove(id) {
            Some(session) => {
                session.end();
                true
            }
            None => false,
        }
    }

    /// A participant's connection went away.
    ///
    /// The opponent gets `opponentDisconnected` and the session ends at
    /// once, grace period or not.
    pub fn handle_disconnect(&mut self, player: PlayerId) {
        let Some(session) = self.registry.lookup_by_participant(&player) else {
            tracing::debug!(player_id = %player, "disconnect from player without a session");
            return;
        };
        let id = session.id().clone();
        if let Some(seat) = session.seat_of(player) {
            session
                .seat(seat.opposite())
                .notify(&ServerMessage::OpponentDisconnected);
        }
        tracing::info!(session_id = %id, player_id = %player, "participant disconnected");
        self.end_session(&id);
    }

    /// Called when the grace timer for `id` fires.
    pub fn expire(&mut self, id: &SessionId) {
        self.teardown.complete(id);
        match self.registry.get(id).map(Session::phase) {
            Some(SessionPhase::TerminalPending) => {
                tracing::info!(session_id = %id, "grace period elapsed");
                self.end_session(id);
            }
            Some(phase) => {
                tracing::warn!(session_id = %id, %phase, "teardown timer fired for a session that is not finished");
            }
            None => {
                tracing::debug!(session_id = %id, "teardown timer fired after the session ended");
            }
        }
    }

    /// Ends every live session. Called when the coordinator stops.
    pub fn shutdown(&mut self) {
        let ids = self.registry.session_ids();
        if !ids.is_empty() {
            tracing::info!(sessions = ids.len(), "ending remaining sessions");
        }
        for id in ids {
            self.end_session(&id);
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// A value copy of the session's engine state.
    pub fn snapshot(&self, id: &SessionId) -> Option<Snapshot> {
        self.registry.get(id).map(|s| s.engine().snapshot())
    }

    pub fn session_of(&self, player: &PlayerId) -> Option<SessionId> {
        self.registry.session_of(player).cloned()
    }

    pub fn phase(&self, id: &SessionId) -> Option<SessionPhase> {
        self.registry.get(id).map(Session::phase)
    }

    /// Returns `true` if the participant has a live session.
    pub fn is_active(&self, player: &PlayerId) -> bool {
        self.registry.is_active(player)
    }

    /// Number of live sessions.
    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Registered game types, sorted.
    pub fn game_types(&self) -> Vec<GameType> {
        self.engines.game_types()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sends each seat its own `sessionFound`.
fn announce(session: &Session, opening: Seat, board_shape: Option<Value>) {
    for seat in [Seat::A, Seat::B] {
        let me = session.seat(seat);
        let opponent = session.seat(seat.opposite());
        me.notify(&ServerMessage::SessionFound {
            session_id: session.id().clone(),
            role: me.role.clone(),
            opponent_id: opponent.id(),
            game_type: session.game_type().clone(),
            moves_first: seat == opening,
            board_shape: board_shape.clone(),
        });
    }
}
