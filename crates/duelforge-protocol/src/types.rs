//! Core protocol types for Duelforge's wire format.
//!
//! Everything in this module either identifies something (a player, a
//! session, a game type, a role) or travels over a participant's
//! connection as a message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a participant.
///
/// Newtype over `u64` so a `PlayerId` can never be confused with any other
/// number floating around the server. `#[serde(transparent)]` keeps the
/// JSON form a plain number: `PlayerId(42)` becomes `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// An opaque identifier for one game session.
///
/// Generated by the session registry at creation and never reused. The
/// contents carry no meaning for clients; they only echo it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw identifier string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Selects which engine implementation backs a session, e.g. `"ticTacToe"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameType(String);

impl GameType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The role or symbol an engine assigns to a participant (`"X"`, `"O"`,
/// `"Red"`, ...). Only the engine knows what it means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ServerMessage: server → participant
// ---------------------------------------------------------------------------

/// Messages the server pushes to a participant's channel.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, so a
/// disconnect notice is just `{ "type": "opponentDisconnected" }`.
/// Variant and field names are camelCase to match what browser clients
/// expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    // -- Connection lifecycle --

    /// Sent once the hello handshake succeeds.
    Welcome {
        player_id: PlayerId,
        /// Game types this server can host, sorted.
        game_types: Vec<GameType>,
    },

    /// The participant is waiting in the lobby for an opponent.
    Queued { game_type: GameType },

    /// Answer to a client `heartbeat`. `server_time` is milliseconds since
    /// the connection was accepted.
    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- Session lifecycle --

    /// A session was created with this participant in it.
    SessionFound {
        session_id: SessionId,
        /// The role the engine assigned to the recipient.
        role: Role,
        opponent_id: PlayerId,
        game_type: GameType,
        /// Whether the recipient makes the opening move.
        moves_first: bool,
        /// Engine-declared board metadata, forwarded untouched.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_shape: Option<Value>,
    },

    /// Full session state. Both participants receive an identical copy.
    GameState {
        session_id: SessionId,
        board: Value,
        current_turn: Option<Role>,
        winner: Option<Role>,
        is_draw: bool,
        is_terminal: bool,
        participant_a_role: Role,
        participant_b_role: Role,
        game_type: GameType,
    },

    /// The recipient's last move was rejected. The opponent never sees this.
    MoveError { reason: String },

    /// The other participant left; the session is already gone.
    OpponentDisconnected,

    // -- Errors --

    /// Request-level failure. `code` follows HTTP conventions
    /// (400 bad request, 404 unknown, 409 conflict).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// ClientMessage: participant → server
// ---------------------------------------------------------------------------

/// Messages a participant sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Must be the first message on a connection.
    Hello { version: u32 },

    /// Ask the lobby to pair us with someone wanting the same game.
    FindMatch { game_type: GameType },

    /// A move for the current session. `data` is engine-specific.
    Move { data: Value },

    /// Forfeit the current session (or leave the queue).
    Leave,

    /// Keep-alive. Resets the idle timer and is answered with
    /// `heartbeatAck`. `client_time` is echoed back untouched.
    Heartbeat {
        #[serde(default)]
        client_time: u64,
    },
}

// =========================================================================
// Tests
// =========================================================================
