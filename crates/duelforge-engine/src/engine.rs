//! The `GameEngine` trait, the extension point for game rules.
//!
//! Every game a server can host implements this trait. The session
//! coordinator never looks inside a board: it asks the engine to seat the
//! players, forwards moves, and copies snapshots out to the participants.

use duelforge_protocol::{PlayerId, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RejectReason;

/// One of the two positions at the table.
///
/// Seat `A` is the first participant passed to
/// [`GameEngine::initialize`], seat `B` the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    A,
    B,
}

impl Seat {
    /// Index into a `[_; 2]` pair ordered A, B.
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    /// The other seat.
    pub fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Result of applying a move. Engines never panic on bad input; every
/// call lands in one of these two variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was legal and the engine state changed.
    Accepted,
    /// The move was refused and the engine state is untouched.
    Rejected(RejectReason),
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// A value copy of an engine's state.
///
/// `board` is opaque to everything but the engine and the client
/// renderer. The remaining fields are the minimum the coordinator needs
/// to describe the game to both participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: Value,
    /// Whose turn it is. `None` once the game is over.
    pub current_turn: Option<Role>,
    pub winner: Option<Role>,
    pub is_draw: bool,
}

/// The contract every pluggable game implements.
///
/// Engines are created per session by a factory registered in the
/// [`EngineRegistry`](crate::EngineRegistry) and are owned exclusively by
/// that session.
///
/// # First mover
///
/// Who opens is declared by the engine through [`opening_seat`]. The
/// default is seat `A`, i.e. whoever the pairing layer listed first. An
/// engine that wants a different rule overrides it and documents why.
///
/// [`opening_seat`]: GameEngine::opening_seat
pub trait GameEngine: Send + 'static {
    /// Seats the two participants and returns their roles, ordered A, B.
    ///
    /// Called exactly once, before any other method. Must be
    /// deterministic for a given input order.
    fn initialize(&mut self, players: [PlayerId; 2]) -> [Role; 2];

    /// Applies a move on behalf of `player`.
    ///
    /// `data` is the raw, engine-specific payload the client sent. A
    /// payload that does not parse is a [`RejectReason::Malformed`], not
    /// an error.
    fn apply_move(&mut self, player: PlayerId, data: &Value) -> MoveOutcome;

    /// Returns a copy of the current state.
    fn snapshot(&self) -> Snapshot;

    /// `true` once there is a winner or the game is a confirmed draw.
    fn is_terminal(&self) -> bool;

    /// The seat that makes the first move. Default: seat `A`.
    fn opening_seat(&self) -> Seat {
        Seat::A
    }

    /// Board metadata forwarded to clients in `sessionFound`, e.g.
    /// `{"rows": 3, "cols": 3}`. Default: none.
    fn board_shape(&self) -> Option<Value> {
        None
    }

    /// Frees whatever the engine holds.
    ///
    /// Takes the boxed engine by value, so it can run at most once; the
    /// coordinator guarantees it runs exactly once per session however
    /// the session ends. Default: just drop.
    fn release(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_index_and_opposite() {
        assert_eq!(Seat::A.index(), 0);
        assert_eq!(Seat::B.index(), 1);
        assert_eq!(Seat::A.opposite(), Seat::B);
        assert_eq!(Seat::B.opposite(), Seat::A);
    }

    #[test]
    fn test_move_outcome_is_accepted() {
        assert!(MoveOutcome::Accepted.is_accepted());
        assert!(!MoveOutcome::Rejected(RejectReason::NotYourTurn).is_accepted());
    }
}
