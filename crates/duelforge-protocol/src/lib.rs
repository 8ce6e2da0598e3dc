//! Wire protocol for Duelforge.
//!
//! - **Types** ([`PlayerId`], [`SessionId`], [`ServerMessage`],
//!   [`ClientMessage`], ...): identifiers and the messages that travel
//!   between a participant and the server.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about sessions or engines; it only
//! names things and serializes them.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientMessage, GameType, PlayerId, Role, ServerMessage, SessionId,
};

/// The current protocol version. Clients must send this in `hello`.
pub const PROTOCOL_VERSION: u32 = 1;
