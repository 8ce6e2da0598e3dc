//! Error types for the session layer.

use duelforge_protocol::{GameType, PlayerId};

/// Errors surfaced by session creation and by the coordinator runtime.
///
/// Move rejections are not here: they are expected, reported to the
/// mover as a `moveError`, and never escape the coordinator. Neither are
/// stray events for participants without a session, nor teardown of a
/// session that is already gone; both are silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    /// No engine factory is registered under this game type.
    #[error("unknown game type: {0}")]
    UnknownGameType(GameType),

    /// The participant already has an active session.
    #[error("player {0} is already in a session")]
    AlreadyInSession(PlayerId),

    /// The participant's channel closed before the session could start.
    #[error("player {0} has disconnected")]
    ParticipantGone(PlayerId),

    /// Both seats were given the same participant.
    #[error("player {0} cannot play against themselves")]
    SameParticipant(PlayerId),

    /// The coordinator task has stopped and can't take commands.
    #[error("session coordinator is unavailable")]
    Unavailable,
}

/// Failure delivering a message to a participant's channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The receiving side of the channel is gone (connection closed).
    #[error("channel closed")]
    ChannelClosed,
}
