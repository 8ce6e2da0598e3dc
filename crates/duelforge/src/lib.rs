//! # Duelforge
//!
//! Server for live two-player, turn-based games.
//!
//! Game rules live behind the [`GameEngine`](duelforge_engine::GameEngine)
//! trait. The server pairs connected players, hands each pair a session
//! backed by a fresh engine, keeps both players' views in sync, and tears
//! the session down when the game ends or someone leaves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duelforge::prelude::*;
//!
//! # async fn run() -> Result<(), DuelforgeError> {
//! let server = DuelforgeServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(builtin_engines())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod lobby;
mod server;

pub use error::DuelforgeError;
pub use lobby::{Lobby, LobbyError, Pairing};
pub use server::{
    DEFAULT_BIND_ADDR, DEFAULT_HANDSHAKE_TIMEOUT_MS, DEFAULT_IDLE_TIMEOUT_MS, DuelforgeServer,
    DuelforgeServerBuilder, ServerConfig,
};

/// Everything needed to run a server or write an engine.
pub mod prelude {
    pub use crate::{DuelforgeError, DuelforgeServer, DuelforgeServerBuilder, ServerConfig};

    pub use duelforge_engine::{
        EngineRegistry, GameEngine, MoveOutcome, RejectReason, Seat, Snapshot,
    };
    pub use duelforge_games::builtin_engines;
    pub use duelforge_protocol::{
        ClientMessage, Codec, GameType, JsonCodec, PROTOCOL_VERSION, PlayerId, Role,
        ServerMessage, SessionId,
    };
    pub use duelforge_session::{CoordinatorConfig, CoordinatorError, CoordinatorHandle};
}
