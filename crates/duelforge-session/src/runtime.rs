//! Coordinator runtime: one Tokio task that owns the [`Coordinator`].
//!
//! Connection handlers, the lobby, and the teardown timers all talk to the
//! coordinator through channels. The actor pulls one event at a time and
//! runs it to completion, so the coordinator never sees two events
//! interleave even on a multi-threaded runtime.

use duelforge_engine::Snapshot;
use duelforge_protocol::{GameType, PlayerId, SessionId};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::teardown::TeardownReceiver;
use crate::{Coordinator, CoordinatorError, Participant};

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 256;

/// Commands sent to the coordinator actor.
///
/// Variants with a `reply` are request/response; the rest are
/// fire-and-forget.
enum Command {
    Create {
        a: Participant,
        b: Participant,
        game_type: GameType,
        reply: oneshot::Sender<Result<SessionId, CoordinatorError>>,
    },
    Move {
        player: PlayerId,
        data: Value,
    },
    Disconnect {
        player: PlayerId,
    },
    SessionOf {
        player: PlayerId,
        reply: oneshot::Sender<Option<SessionId>>,
    },
    Snapshot {
        session_id: SessionId,
        reply: oneshot::Sender<Option<Snapshot>>,
    },
    GameTypes {
        reply: oneshot::Sender<Vec<GameType>>,
    },
}

/// Handle to a running coordinator actor.
///
/// Cheap to clone: it's just an `mpsc::Sender`. The actor stops once every
/// handle has been dropped, ending any sessions still live.
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Creates a session for `a` (seat A) and `b` (seat B).
    pub async fn create_session(
        &self,
        a: Participant,
        b: Participant,
        game_type: GameType,
    ) -> Result<SessionId, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Create {
            a,
            b,
            game_type,
            reply,
        })
        .await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)?
    }

    /// Forwards a move (fire-and-forget). The outcome reaches the mover
    /// through their channel.
    pub async fn submit_move(&self, player: PlayerId, data: Value) -> Result<(), CoordinatorError> {
        self.send(Command::Move { player, data }).await
    }

    /// Reports that a participant's connection went away.
    pub async fn disconnect(&self, player: PlayerId) -> Result<(), CoordinatorError> {
        self.send(Command::Disconnect { player }).await
    }

    /// The session a participant is currently in.
    pub async fn session_of(&self, player: PlayerId) -> Result<Option<SessionId>, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SessionOf { player, reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)
    }

    /// A copy of a session's engine state.
    pub async fn snapshot(&self, session_id: SessionId) -> Result<Option<Snapshot>, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { session_id, reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)
    }

    /// Game types the coordinator can host, sorted.
    pub async fn game_types(&self) -> Result<Vec<GameType>, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::GameTypes { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)
    }

    async fn send(&self, cmd: Command) -> Result<(), CoordinatorError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| CoordinatorError::Unavailable)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create { .. } => "Create",
            Self::Move { .. } => "Move",
            Self::Disconnect { .. } => "Disconnect",
            Self::SessionOf { .. } => "SessionOf",
            Self::Snapshot { .. } => "Snapshot",
            Self::GameTypes { .. } => "GameTypes",
        };
        f.write_str(name)
    }
}

/// Spawns the actor task and returns a handle to it.
///
/// `expiries` must be the receiver returned alongside `coordinator` by
/// [`Coordinator::new`]. Must be called from within a Tokio runtime.
pub fn spawn_coordinator(coordinator: Coordinator, expiries: TeardownReceiver) -> CoordinatorHandle {
    let (sender, commands) = mpsc::channel(COMMAND_BUFFER);
    let actor = CoordinatorActor {
        coordinator,
        commands,
        expiries,
    };
    tokio::spawn(actor.run());
    CoordinatorHandle { sender }
}

struct CoordinatorActor {
    coordinator: Coordinator,
    commands: mpsc::Receiver<Command>,
    expiries: TeardownReceiver,
}

impl CoordinatorActor {
    async fn run(mut self) {
        tracing::info!(
            game_types = ?self.coordinator.game_types(),
            grace_ms = self.coordinator.config().teardown_grace_ms,
            "session coordinator started"
        );

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(id) = self.expiries.recv() => self.coordinator.expire(&id),
            }
        }

        self.coordinator.shutdown();
        tracing::info!("session coordinator stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Create {
                a,
                b,
                game_type,
                reply,
            } => {
                let result = self.coordinator.create_session(a, b, &game_type);
                if let Err(e) = &result {
                    tracing::debug!(%game_type, error = %e, "session creation refused");
                }
                let _ = reply.send(result);
            }
            Command::Move { player, data } => self.coordinator.handle_move(player, &data),
            Command::Disconnect { player } => self.coordinator.handle_disconnect(player),
            Command::SessionOf { player, reply } => {
                let _ = reply.send(self.coordinator.session_of(&player));
            }
            Command::Snapshot { session_id, reply } => {
                let _ = reply.send(self.coordinator.snapshot(&session_id));
            }
            Command::GameTypes { reply } => {
                let _ = reply.send(self.coordinator.game_types());
            }
        }
    }
}
