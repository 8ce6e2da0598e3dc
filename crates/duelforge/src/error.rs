//! Unified error type for the Duelforge server.

use duelforge_protocol::ProtocolError;
use duelforge_session::CoordinatorError;
use duelforge_transport::TransportError;

/// Top-level error wrapping the errors of every layer the server touches.
///
/// The `#[from]` conversions let `?` lift layer errors into this one.
#[derive(Debug, thiserror::Error)]
pub enum DuelforgeError {
    /// Bind, accept, send, or receive failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode, decode, or a protocol rule was broken.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The coordinator refused a request or has stopped.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}
