//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed (bytes → Rust value). Usually malformed
    /// JSON or an unknown `type` tag.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, e.g. a
    /// `move` arriving before `hello`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
