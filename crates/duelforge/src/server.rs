//! `DuelforgeServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → lobby → session
//! coordinator.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use duelforge_engine::EngineRegistry;
use duelforge_protocol::{Codec, GameType, JsonCodec, PlayerId};
use duelforge_session::{Coordinator, CoordinatorConfig, CoordinatorHandle, spawn_coordinator};
use duelforge_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::DuelforgeError;
use crate::handler::handle_connection;
use crate::lobby::Lobby;

/// Default listening address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default time a connection may stay silent before it is dropped.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 60_000;

/// Default time a client has to send `hello`.
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 5_000;

/// Server settings. Every field has a default, so a partial JSON or
/// TOML document deserializes fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Milliseconds of inbound silence before a connection is closed.
    pub idle_timeout_ms: u64,
    /// Milliseconds a new connection has to complete the hello handshake.
    pub handshake_timeout_ms: u64,
    pub coordinator: CoordinatorConfig,
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            coordinator: CoordinatorConfig::default(),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) coordinator: CoordinatorHandle,
    /// Held across the matching coordinator call whenever a player
    /// enters or leaves the queue, so pairing and disconnects are
    /// applied to the lobby and the coordinator in the same order.
    pub(crate) lobby: Mutex<Lobby>,
    /// Snapshot of the engine registry's game types, taken at build time.
    pub(crate) game_types: Vec<GameType>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
    next_player_id: AtomicU64,
}

impl<C: Codec> ServerState<C> {
    pub(crate) fn new(
        coordinator: CoordinatorHandle,
        game_types: Vec<GameType>,
        codec: C,
        config: ServerConfig,
    ) -> Self {
        Self {
            coordinator,
            lobby: Mutex::new(Lobby::new()),
            game_types,
            codec,
            config,
            next_player_id: AtomicU64::new(1),
        }
    }

    /// Hands out the next player id. Ids start at 1 and are never reused.
    pub(crate) fn next_player_id(&self) -> PlayerId {
        PlayerId(self.next_player_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn hosts(&self, game_type: &GameType) -> bool {
        self.game_types.contains(game_type)
    }
}

/// Builder for configuring and starting a server.
///
/// ```rust,ignore
/// use duelforge::prelude::*;
///
/// let server = DuelforgeServer::builder()
///     .bind("0.0.0.0:8080")
///     .teardown_grace(Duration::from_secs(5))
///     .build(builtin_engines())
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct DuelforgeServerBuilder {
    config: ServerConfig,
}

impl DuelforgeServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the delay between a finished game and its teardown.
    pub fn teardown_grace(mut self, grace: Duration) -> Self {
        self.config.coordinator = CoordinatorConfig::with_grace(grace);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Binds the listener and starts the session coordinator.
    ///
    /// Uses [`JsonCodec`] on the wire.
    pub async fn build(
        self,
        engines: EngineRegistry,
    ) -> Result<DuelforgeServer<JsonCodec>, DuelforgeError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let game_types = engines.game_types();
        let (coordinator, expiries) = Coordinator::new(self.config.coordinator.clone(), engines);
        let coordinator = spawn_coordinator(coordinator, expiries);

        let state = Arc::new(ServerState::new(coordinator, game_types, JsonCodec, self.config));

        Ok(DuelforgeServer { transport, state })
    }
}

/// A bound server. Call [`run`](Self::run) to start accepting.
pub struct DuelforgeServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl DuelforgeServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DuelforgeServerBuilder {
        DuelforgeServerBuilder::new()
    }
}

impl<C: Codec + Clone> DuelforgeServer<C> {
    /// The address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the server's session coordinator.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.state.coordinator.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection gets its own handler task.
    pub async fn run(mut self) -> Result<(), DuelforgeError> {
        tracing::info!(
            addr = ?self.local_addr().ok(),
            game_types = ?self.state.game_types,
            "Duelforge server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
