//! Per-connection handler: hello handshake, then message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `hello` → validate version, assign a `PlayerId`
//!   2. Spawn the writer task and send `welcome`
//!   3. Loop: receive client messages → lobby or coordinator
//!
//! Any inbound frame resets the idle timer, WebSocket pings included. A
//! player waiting for the opponent's move is silent otherwise, so clients
//! are expected to send `heartbeat` (or pings) while they wait.
//!
//! Everything addressed to the client, whether from this handler or from
//! the coordinator, goes through one unbounded channel drained by the
//! writer task, so messages reach the socket in the order they were sent.

use std::sync::Arc;
use std::time::Instant;

use duelforge_protocol::{
    ClientMessage, Codec, GameType, PROTOCOL_VERSION, PlayerId, ProtocolError, ServerMessage,
};
use duelforge_session::{CoordinatorError, Participant, ParticipantSender};
use duelforge_transport::{
    Connection, FrameReceiver, FrameSender, Inbound, WebSocketConnection, WebSocketReceiver,
    WebSocketSender,
};
use tokio::sync::mpsc;

use crate::DuelforgeError;
use crate::lobby::Pairing;
use crate::server::ServerState;

/// Drop guard that takes a player out of the lobby and their session when
/// the handler exits, however it exits.
///
/// `Drop` is synchronous, so the cleanup runs in a fire-and-forget task.
struct ConnectionGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move { release_player(&state, player_id).await });
    }
}

/// Takes a player out of the lobby and out of their session.
///
/// The lobby lock is held until the disconnect is queued, so a pairing in
/// [`find_match`] either still finds the player waiting or creates its
/// session before the disconnect reaches the coordinator.
async fn release_player<C: Codec>(state: &ServerState<C>, player_id: PlayerId) {
    let mut lobby = state.lobby.lock().await;
    lobby.remove(player_id);
    if let Err(e) = state.coordinator.disconnect(player_id).await {
        tracing::debug!(%player_id, error = %e, "disconnect not delivered");
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DuelforgeError>
where
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");
    let (mut sink, mut stream) = conn.split();

    // --- Step 1: Handshake ---
    perform_handshake(&mut sink, &mut stream, &state).await?;
    let player_id = state.next_player_id();
    tracing::info!(%conn_id, %player_id, "player connected");

    // --- Step 2: Writer + welcome ---
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(sink, rx, state.codec.clone(), player_id));
    let _guard = ConnectionGuard {
        player_id,
        state: Arc::clone(&state),
    };
    send(
        &tx,
        ServerMessage::Welcome {
            player_id,
            game_types: state.game_types.clone(),
        },
    );

    // --- Step 3: Message loop ---
    let started = Instant::now();
    let idle = state.config.idle_timeout();
    loop {
        let inbound = match tokio::time::timeout(idle, stream.next_inbound()).await {
            Ok(Ok(Some(inbound))) => inbound,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        };

        let data = match inbound {
            Inbound::Frame(data) => data,
            Inbound::KeepAlive => continue,
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode client message");
                send_error(&tx, 400, &format!("invalid message: {e}"));
                continue;
            }
        };

        match msg {
            ClientMessage::Hello { .. } => send_error(&tx, 400, "already greeted"),
            ClientMessage::FindMatch { game_type } => {
                find_match(&state, player_id, &tx, game_type).await?;
            }
            ClientMessage::Move { data } => {
                state.coordinator.submit_move(player_id, data).await?;
            }
            ClientMessage::Leave => {
                tracing::info!(%player_id, "player left");
                release_player(&state, player_id).await;
            }
            ClientMessage::Heartbeat { client_time } => send(
                &tx,
                ServerMessage::HeartbeatAck {
                    client_time,
                    server_time: started.elapsed().as_millis() as u64,
                },
            ),
        }
    }

    // _guard drops here → lobby removal and disconnect fire. The writer
    // stops once the lobby and the coordinator let go of their senders.
    Ok(())
}

/// Waits for `hello` and checks the protocol version. On failure the
/// client gets an `error` and the connection is closed.
async fn perform_handshake<C: Codec>(
    sink: &mut WebSocketSender,
    stream: &mut WebSocketReceiver,
    state: &ServerState<C>,
) -> Result<(), DuelforgeError> {
    let data = match tokio::time::timeout(state.config.handshake_timeout(), stream.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before hello".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("hello timed out".into()).into());
        }
    };

    let version = match state.codec.decode::<ClientMessage>(&data) {
        Ok(ClientMessage::Hello { version }) => version,
        _ => {
            reject(sink, &state.codec, 400, "expected hello").await?;
            return Err(ProtocolError::InvalidMessage("first message must be hello".into()).into());
        }
    };

    if version != PROTOCOL_VERSION {
        reject(
            sink,
            &state.codec,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    Ok(())
}

/// Queues the player, or pairs them and asks the coordinator for a
/// session.
///
/// Runs with the lobby locked throughout, so the waiter taken out of the
/// queue cannot be released (or queue again) before their session exists.
/// A waiter who turns out to be gone or already playing is skipped and the
/// caller tries the queue again.
async fn find_match<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    tx: &ParticipantSender,
    game_type: GameType,
) -> Result<(), DuelforgeError> {
    if !state.hosts(&game_type) {
        send_error(tx, 404, &format!("unknown game type: {game_type}"));
        return Ok(());
    }

    let mut lobby = state.lobby.lock().await;
    if state.coordinator.session_of(player_id).await?.is_some() {
        send_error(tx, 409, "already in a session");
        return Ok(());
    }

    let me = Participant::new(player_id, tx.clone());
    loop {
        let waiter = match lobby.enqueue(me.clone(), game_type.clone()) {
            Err(e) => {
                send_error(tx, 409, &e.to_string());
                return Ok(());
            }
            Ok(Pairing::Queued) => {
                send(tx, ServerMessage::Queued { game_type });
                return Ok(());
            }
            Ok(Pairing::Matched(waiter)) => waiter,
        };

        let waiter_id = waiter.id;
        match state
            .coordinator
            .create_session(waiter, me.clone(), game_type.clone())
            .await
        {
            Ok(session_id) => {
                tracing::info!(%session_id, player_a = %waiter_id, player_b = %player_id, "match started");
                return Ok(());
            }
            Err(CoordinatorError::Unavailable) => return Err(CoordinatorError::Unavailable.into()),
            Err(CoordinatorError::ParticipantGone(p) | CoordinatorError::AlreadyInSession(p))
                if p == waiter_id =>
            {
                tracing::debug!(%player_id, opponent = %waiter_id, "waiting player unavailable, requeueing");
            }
            Err(e) => {
                tracing::warn!(%player_id, opponent = %waiter_id, error = %e, "pairing failed");
                send_error(tx, 409, &e.to_string());
                return Ok(());
            }
        }
    }
}

/// Drains the outbound channel into the socket.
async fn write_loop<C: Codec>(
    mut sink: WebSocketSender,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    codec: C,
    player_id: PlayerId,
) {
    while let Some(msg) = rx.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(e) = sink.send(&bytes).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            return;
        }
    }
    let _ = sink.close().await;
}

/// Sends an `error` straight to the socket and closes it. Only used
/// before the writer task exists.
async fn reject(
    sink: &mut WebSocketSender,
    codec: &impl Codec,
    code: u16,
    message: &str,
) -> Result<(), DuelforgeError> {
    let bytes = codec.encode(&ServerMessage::Error {
        code,
        message: message.to_string(),
    })?;
    sink.send(&bytes).await?;
    let _ = sink.close().await;
    Ok(())
}

fn send(tx: &ParticipantSender, msg: ServerMessage) {
    // The writer only goes away with the connection.
    let _ = tx.send(msg);
}

fn send_error(tx: &ParticipantSender, code: u16, message: &str) {
    send(
        tx,
        ServerMessage::Error {
            code,
            message: message.to_string(),
        },
    );
}
