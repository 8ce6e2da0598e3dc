//! Transport abstraction layer for Duelforge.
//!
//! A [`Transport`] accepts connections. A [`Connection`] is split into a
//! [`FrameSender`] and a [`FrameReceiver`] so one task can block on reads
//! while another pushes outbound frames.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    WebSocketConnection, WebSocketReceiver, WebSocketSender, WebSocketTransport,
};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// An accepted connection, not yet split.
pub trait Connection: Send + 'static {
    type Sender: FrameSender;
    type Receiver: FrameReceiver;

    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;

    /// Splits the connection into independently owned halves.
    fn split(self) -> (Self::Sender, Self::Receiver);
}

/// The outbound half of a connection.
pub trait FrameSender: Send + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame. UTF-8 payloads go out as text frames.
    async fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends a close frame.
    async fn close(&mut self) -> Result<(), Self::Error>;
}

/// One event read from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// An application data frame.
    Frame(Vec<u8>),
    /// A control frame such as a WebSocket ping. Carries no data but
    /// shows the peer is still there.
    KeepAlive,
}

/// The inbound half of a connection.
pub trait FrameReceiver: Send + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Receives the next frame, control frames included.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn next_inbound(&mut self) -> Result<Option<Inbound>, Self::Error>;

    /// Receives the next data frame, skipping keep-alives.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            match self.next_inbound().await? {
                Some(Inbound::Frame(data)) => return Ok(Some(data)),
                Some(Inbound::KeepAlive) => continue,
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }
}
