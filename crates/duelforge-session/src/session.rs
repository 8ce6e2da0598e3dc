//! Session types: one live game between two seated participants.

use std::fmt;

use duelforge_engine::{GameEngine, Seat};
use duelforge_protocol::{GameType, PlayerId, Role, ServerMessage, SessionId};

use crate::Participant;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// ```text
/// Created → Active → TerminalPending → Ended
///              │                         ↑
///              └──────(disconnect)───────┘
/// ```
///
/// - **Created**: engine built and initialized, not yet registered.
/// - **Active**: registered; moves are routed to the engine.
/// - **TerminalPending**: the engine reported a winner or draw; the final
///   state has been broadcast and the teardown timer is running.
/// - **Ended**: removed from the registry, engine released.
///
/// A disconnect ends a session from either `Active` or `TerminalPending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    Active,
    TerminalPending,
    Ended,
}

impl SessionPhase {
    /// Returns `true` if moving from `self` to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Created, Self::Active)
                | (Self::Active, Self::TerminalPending)
                | (Self::Active, Self::Ended)
                | (Self::TerminalPending, Self::Ended)
        )
    }

    /// Returns `true` while the session is registered and lookupable.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::TerminalPending)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Active => write!(f, "Active"),
            Self::TerminalPending => write!(f, "TerminalPending"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Seated participants
// ---------------------------------------------------------------------------

/// A participant together with the role the engine gave them.
#[derive(Debug, Clone)]
pub struct SeatedParticipant {
    pub participant: Participant,
    pub role: Role,
}

impl SeatedParticipant {
    pub fn id(&self) -> PlayerId {
        self.participant.id
    }

    pub fn notify(&self, msg: &ServerMessage) {
        self.participant.notify(msg);
    }
}

// ---------------------------------------------------------------------------
// SessionDraft / Session
// ---------------------------------------------------------------------------

/// Everything a session needs except its identifier, which the registry
/// assigns on [`register`](crate::SessionRegistry::register).
pub struct SessionDraft {
    pub game_type: GameType,
    pub engine: Box<dyn GameEngine>,
    /// Ordered A, B.
    pub seats: [SeatedParticipant; 2],
}

impl SessionDraft {
    /// Releases the engine of a draft that never became a session.
    pub fn discard(self) {
        self.engine.release();
    }
}

impl fmt::Debug for SessionDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDraft")
            .field("game_type", &self.game_type)
            .field("seats", &self.seats)
            .finish_non_exhaustive()
    }
}

/// A registered, live game between exactly two participants.
///
/// The engine is owned by the session and by nothing else; it is released
/// when the session is torn down.
pub struct Session {
    id: SessionId,
    game_type: GameType,
    engine: Box<dyn GameEngine>,
    seats: [SeatedParticipant; 2],
    phase: SessionPhase,
}

impl Session {
    pub(crate) fn from_draft(id: SessionId, draft: SessionDraft) -> Self {
        Self {
            id,
            game_type: draft.game_type,
            engine: draft.engine,
            seats: draft.seats,
            phase: SessionPhase::Created,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn game_type(&self) -> &GameType {
        &self.game_type
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Both seats, ordered A, B.
    pub fn seats(&self) -> &[SeatedParticipant; 2] {
        &self.seats
    }

    pub fn seat(&self, seat: Seat) -> &SeatedParticipant {
        &self.seats[seat.index()]
    }

    /// Which seat `player` occupies, if any.
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if self.seats[0].id() == player {
            Some(Seat::A)
        } else if self.seats[1].id() == player {
            Some(Seat::B)
        } else {
            None
        }
    }

    /// Both participant ids, ordered A, B.
    pub fn player_ids(&self) -> [PlayerId; 2] {
        [self.seats[0].id(), self.seats[1].id()]
    }

    pub fn engine(&self) -> &dyn GameEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn GameEngine {
        self.engine.as_mut()
    }

    /// Moves to `next`, logging and ignoring transitions the state
    /// machine does not allow.
    pub(crate) fn advance(&mut self, next: SessionPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            tracing::warn!(
                session_id = %self.id,
                from = %self.phase,
                to = %next,
                "ignoring invalid session phase transition"
            );
            return false;
        }
        tracing::debug!(session_id = %self.id, from = %self.phase, to = %next, "session phase");
        self.phase = next;
        true
    }

    /// Ends the session and releases its engine. Consumes the session, so
    /// the engine cannot be released twice.
    pub(crate) fn end(mut self) {
        self.advance(SessionPhase::Ended);
        self.engine.release();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("game_type", &self.game_type)
            .field("phase", &self.phase)
            .field("seats", &self.seats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_happy_path_transitions() {
        assert!(SessionPhase::Created.can_transition_to(SessionPhase::Active));
        assert!(SessionPhase::Active.can_transition_to(SessionPhase::TerminalPending));
        assert!(SessionPhase::TerminalPending.can_transition_to(SessionPhase::Ended));
    }

    #[test]
    fn test_phase_disconnect_skips_terminal_pending() {
        assert!(SessionPhase::Active.can_transition_to(SessionPhase::Ended));
    }

    #[test]
    fn test_phase_rejects_backwards_and_skips() {
        assert!(!SessionPhase::Created.can_transition_to(SessionPhase::TerminalPending));
        assert!(!SessionPhase::Created.can_transition_to(SessionPhase::Ended));
        assert!(!SessionPhase::TerminalPending.can_transition_to(SessionPhase::Active));
        assert!(!SessionPhase::Ended.can_transition_to(SessionPhase::Active));
        assert!(!SessionPhase::Ended.can_transition_to(SessionPhase::Ended));
    }

    #[test]
    fn test_phase_is_live() {
        assert!(!SessionPhase::Created.is_live());
        assert!(SessionPhase::Active.is_live());
        assert!(SessionPhase::TerminalPending.is_live());
        assert!(!SessionPhase::Ended.is_live());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::TerminalPending.to_string(), "TerminalPending");
    }
}
