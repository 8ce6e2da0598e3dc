//! Move rejection reasons.

use duelforge_protocol::PlayerId;

/// Why an engine refused a move.
///
/// The `Display` text is what the originating participant sees in its
/// `moveError` message, so keep it short and player-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The sender is seated, but it is the opponent's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The target position does not exist on this board.
    #[error("illegal position: {0}")]
    IllegalPosition(String),

    /// The target position is already taken.
    #[error("{0} is occupied")]
    Occupied(String),

    /// The game already has a winner or ended in a draw.
    #[error("game is over")]
    GameOver,

    /// The move payload did not parse for this game.
    #[error("malformed move: {0}")]
    Malformed(String),

    /// The sender is not one of the two seated players.
    #[error("player {0} is not seated in this game")]
    NotSeated(PlayerId),
}
