//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{
    Connection, ConnectionId, FrameReceiver, FrameSender, Inbound, Transport, TransportError,
};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How long a client gets to complete the HTTP upgrade.
const UPGRADE_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<TcpStream>;

fn io_error(kind: std::io::ErrorKind, e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> std::io::Error {
    std::io::Error::new(kind, e)
}

/// A WebSocket [`Transport`] listening on a TCP socket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds to `addr`. Use port `0` to let the OS pick one.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = match tokio::time::timeout(UPGRADE_TIMEOUT, tokio_tungstenite::accept_async(stream)).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => {
                return Err(TransportError::AcceptFailed(io_error(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                )));
            }
            Err(_) => {
                return Err(TransportError::AcceptFailed(io_error(
                    std::io::ErrorKind::TimedOut,
                    "websocket upgrade timed out",
                )));
            }
        };

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "accepted WebSocket connection");

        Ok(WebSocketConnection { id, peer, ws })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single upgraded WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    ws: WsStream,
}

impl Connection for WebSocketConnection {
    type Sender = WebSocketSender;
    type Receiver = WebSocketReceiver;

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn split(self) -> (WebSocketSender, WebSocketReceiver) {
        let (sink, stream) = self.ws.split();
        (
            WebSocketSender { id: self.id, sink },
            WebSocketReceiver { id: self.id, stream },
        )
    }
}

/// Outbound half of a [`WebSocketConnection`].
pub struct WebSocketSender {
    id: ConnectionId,
    sink: SplitSink<WsStream, Message>,
}

impl WebSocketSender {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl FrameSender for WebSocketSender {
    type Error = TransportError;

    async fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(data.to_vec().into()),
        };
        self.sink
            .send(msg)
            .await
            .map_err(|e| TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e)))
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e)))
    }
}

/// Inbound half of a [`WebSocketConnection`].
pub struct WebSocketReceiver {
    id: ConnectionId,
    stream: SplitStream<WsStream>,
}

impl WebSocketReceiver {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl FrameReceiver for WebSocketReceiver {
    type Error = TransportError;

    async fn next_inbound(&mut self) -> Result<Option<Inbound>, Self::Error> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Inbound::Frame(text.as_bytes().to_vec())));
                }
                Some(Ok(Message::Binary(data))) => return Ok(Some(Inbound::Frame(data.into()))),
                // tungstenite queues the pong itself
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => return Ok(Some(Inbound::KeepAlive)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(Message::Frame(_))) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }
}
