//! Integration tests for the server: real WebSocket clients against a
//! server bound to a random port.

use std::time::Duration;

use duelforge::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Starts a server on a random port and returns the address.
async fn start_server(builder: DuelforgeServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .build(builtin_engines())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn start_default_server() -> String {
    start_server(DuelforgeServer::builder().teardown_grace(Duration::from_millis(100))).await
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_json(ws: &mut ClientWs, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

/// Next text frame as JSON. Panics on close or timeout.
async fn recv_json(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("valid json"),
            Message::Close(_) => panic!("connection closed while waiting for a message"),
            _ => continue,
        }
    }
}

/// Returns `true` once the server has closed the connection.
async fn closed(ws: &mut ClientWs) -> bool {
    loop {
        match tokio::time::timeout(RECV_TIMEOUT, ws.next()).await {
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
            Err(_) => return false,
        }
    }
}

/// Connects and completes the hello handshake. Returns the socket and the
/// assigned player id.
async fn join(addr: &str) -> (ClientWs, u64) {
    let mut ws = connect(addr).await;
    send_json(&mut ws, json!({ "type": "hello", "version": PROTOCOL_VERSION })).await;
    let welcome = recv_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    let id = welcome["playerId"].as_u64().expect("numeric player id");
    (ws, id)
}

/// Pairs two fresh clients into a tic-tac-toe session. The first one is X.
/// Consumes the queued/sessionFound/gameState messages.
async fn paired(addr: &str) -> (ClientWs, ClientWs) {
    let (mut x, _) = join(addr).await;
    let (mut o, _) = join(addr).await;

    send_json(&mut x, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut x).await["type"], "queued");
    send_json(&mut o, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;

    for ws in [&mut x, &mut o] {
        assert_eq!(recv_json(ws).await["type"], "sessionFound");
        assert_eq!(recv_json(ws).await["type"], "gameState");
    }
    (x, o)
}

async fn place(ws: &mut ClientWs, row: usize, col: usize) {
    send_json(ws, json!({ "type": "move", "data": { "row": row, "col": col } })).await;
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_hello_gets_welcome_with_game_types() {
    let addr = start_default_server().await;
    let mut ws = connect(&addr).await;

    send_json(&mut ws, json!({ "type": "hello", "version": PROTOCOL_VERSION })).await;
    let welcome = recv_json(&mut ws).await;

    assert_eq!(welcome["type"], "welcome");
    assert!(welcome["playerId"].as_u64().unwrap() >= 1);
    assert_eq!(welcome["gameTypes"], json!(["connectFour", "ticTacToe"]));
}

#[tokio::test]
async fn test_each_connection_gets_a_distinct_player_id() {
    let addr = start_default_server().await;
    let (_a, id_a) = join(&addr).await;
    let (_b, id_b) = join(&addr).await;
    assert_ne!(id_a, id_b);
}

#[tokio::test]
async fn test_wrong_version_is_rejected_and_closed() {
    let addr = start_default_server().await;
    let mut ws = connect(&addr).await;

    send_json(&mut ws, json!({ "type": "hello", "version": 99 })).await;
    let err = recv_json(&mut ws).await;

    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], 400);
    assert!(err["message"].as_str().unwrap().contains("version mismatch"));
    assert!(closed(&mut ws).await);
}

#[tokio::test]
async fn test_first_message_must_be_hello() {
    let addr = start_default_server().await;
    let mut ws = connect(&addr).await;

    send_json(&mut ws, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    let err = recv_json(&mut ws).await;

    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], 400);
    assert!(closed(&mut ws).await);
}

#[tokio::test]
async fn test_garbage_after_hello_gets_error_and_connection_survives() {
    let addr = start_default_server().await;
    let (mut ws, _) = join(&addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    let err = recv_json(&mut ws).await;
    assert_eq!(err["code"], 400);

    send_json(&mut ws, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut ws).await["type"], "queued");
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test]
async fn test_unknown_game_type_is_404() {
    let addr = start_default_server().await;
    let (mut ws, _) = join(&addr).await;

    send_json(&mut ws, json!({ "type": "findMatch", "gameType": "chess" })).await;
    let err = recv_json(&mut ws).await;

    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], 404);
}

#[tokio::test]
async fn test_two_players_are_paired_and_first_is_x() {
    let addr = start_default_server().await;
    let (mut a, id_a) = join(&addr).await;
    let (mut b, id_b) = join(&addr).await;

    send_json(&mut a, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    let queued = recv_json(&mut a).await;
    assert_eq!(queued, json!({ "type": "queued", "gameType": "ticTacToe" }));

    send_json(&mut b, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;

    let found_a = recv_json(&mut a).await;
    let found_b = recv_json(&mut b).await;
    assert_eq!(found_a["type"], "sessionFound");
    assert_eq!(found_a["role"], "X");
    assert_eq!(found_a["movesFirst"], true);
    assert_eq!(found_a["opponentId"], id_b);
    assert_eq!(found_a["boardShape"], json!({ "rows": 3, "cols": 3 }));
    assert_eq!(found_b["role"], "O");
    assert_eq!(found_b["movesFirst"], false);
    assert_eq!(found_b["opponentId"], id_a);
    assert_eq!(found_a["sessionId"], found_b["sessionId"]);

    let state_a = recv_json(&mut a).await;
    let state_b = recv_json(&mut b).await;
    assert_eq!(state_a["type"], "gameState");
    assert_eq!(state_a, state_b);
    assert_eq!(state_a["currentTurn"], "X");
    assert_eq!(state_a["participantARole"], "X");
    assert_eq!(state_a["participantBRole"], "O");
}

#[tokio::test]
async fn test_find_match_twice_while_queued_is_409() {
    let addr = start_default_server().await;
    let (mut ws, _) = join(&addr).await;

    send_json(&mut ws, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut ws).await["type"], "queued");

    send_json(&mut ws, json!({ "type": "findMatch", "gameType": "connectFour" })).await;
    let err = recv_json(&mut ws).await;
    assert_eq!(err["code"], 409);
}

#[tokio::test]
async fn test_find_match_while_in_session_is_409() {
    let addr = start_default_server().await;
    let (mut x, _o) = paired(&addr).await;

    send_json(&mut x, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    let err = recv_json(&mut x).await;
    assert_eq!(err["code"], 409);
    assert_eq!(err["message"], "already in a session");
}

// =========================================================================
// Moves
// =========================================================================

#[tokio::test]
async fn test_move_is_broadcast_to_both() {
    let addr = start_default_server().await;
    let (mut x, mut o) = paired(&addr).await;

    place(&mut x, 1, 1).await;

    let sx = recv_json(&mut x).await;
    let so = recv_json(&mut o).await;
    assert_eq!(sx, so);
    assert_eq!(sx["board"][1][1], "X");
    assert_eq!(sx["currentTurn"], "O");
}

#[tokio::test]
async fn test_occupied_cell_error_goes_to_mover_only() {
    let addr = start_default_server().await;
    let (mut x, mut o) = paired(&addr).await;

    place(&mut x, 0, 0).await;
    recv_json(&mut x).await;
    recv_json(&mut o).await;

    place(&mut o, 0, 0).await;
    let err = recv_json(&mut o).await;
    assert_eq!(err["type"], "moveError");
    assert!(err["reason"].as_str().unwrap().contains("occupied"));

    // O still holds the turn: a legal move now goes through, and it is
    // the next thing X hears about.
    place(&mut o, 2, 2).await;
    let next_for_x = recv_json(&mut x).await;
    assert_eq!(next_for_x["type"], "gameState");
    assert_eq!(next_for_x["board"][2][2], "O");
}

#[tokio::test]
async fn test_full_game_ends_with_winner_and_players_can_requeue() {
    let addr = start_default_server().await;
    let (mut x, mut o) = paired(&addr).await;

    for (who, row, col) in [(0, 0, 0), (1, 1, 0), (0, 0, 1), (1, 1, 1), (0, 0, 2)] {
        let mover = if who == 0 { &mut x } else { &mut o };
        place(mover, row, col).await;
        recv_json(&mut x).await;
        recv_json(&mut o).await;
    }

    // Grace period is 100ms in these tests; wait it out.
    tokio::time::sleep(Duration::from_millis(300)).await;

    send_json(&mut x, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut x).await["type"], "queued");
}

#[tokio::test]
async fn test_terminal_state_is_reported_to_both() {
    let addr = start_default_server().await;
    let (mut x, mut o) = paired(&addr).await;

    let moves = [(true, 0, 0), (false, 1, 0), (true, 0, 1), (false, 1, 1), (true, 0, 2)];
    let mut last = Value::Null;
    for (is_x, row, col) in moves {
        place(if is_x { &mut x } else { &mut o }, row, col).await;
        last = recv_json(&mut x).await;
        assert_eq!(recv_json(&mut o).await, last);
    }

    assert_eq!(last["winner"], "X");
    assert_eq!(last["isTerminal"], true);
    assert_eq!(last["currentTurn"], Value::Null);
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_closing_connection_notifies_opponent() {
    let addr = start_default_server().await;
    let (mut x, mut o) = paired(&addr).await;

    o.close(None).await.unwrap();

    let msg = recv_json(&mut x).await;
    assert_eq!(msg, json!({ "type": "opponentDisconnected" }));

    // The session is gone, so X can look for a new game.
    send_json(&mut x, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut x).await["type"], "queued");
}

#[tokio::test]
async fn test_leave_forfeits_and_notifies_opponent() {
    let addr = start_default_server().await;
    let (mut x, mut o) = paired(&addr).await;

    send_json(&mut x, json!({ "type": "leave" })).await;

    assert_eq!(recv_json(&mut o).await["type"], "opponentDisconnected");
    // X's connection stays open.
    send_json(&mut x, json!({ "type": "findMatch", "gameType": "connectFour" })).await;
    assert_eq!(recv_json(&mut x).await["type"], "queued");
}

#[tokio::test]
async fn test_queued_player_who_leaves_is_not_paired() {
    let addr = start_default_server().await;
    let (mut a, _) = join(&addr).await;
    let (mut b, _) = join(&addr).await;

    send_json(&mut a, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut a).await["type"], "queued");
    send_json(&mut a, json!({ "type": "leave" })).await;
    // Give the leave a moment to reach the lobby.
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_json(&mut b, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut b).await["type"], "queued");
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let addr = start_server(DuelforgeServer::builder().idle_timeout(Duration::from_millis(200))).await;
    let (mut ws, _) = join(&addr).await;

    assert!(closed(&mut ws).await);
}

#[tokio::test]
async fn test_heartbeat_is_acknowledged() {
    let addr = start_default_server().await;
    let (mut ws, _) = join(&addr).await;

    send_json(&mut ws, json!({ "type": "heartbeat", "clientTime": 42 })).await;

    let ack = recv_json(&mut ws).await;
    assert_eq!(ack["type"], "heartbeatAck");
    assert_eq!(ack["clientTime"], 42);
    assert!(ack["serverTime"].is_u64());
}

#[tokio::test]
async fn test_keep_alives_hold_a_slow_game_open() {
    let addr = start_server(
        DuelforgeServer::builder()
            .teardown_grace(Duration::from_millis(100))
            .idle_timeout(Duration::from_millis(400)),
    )
    .await;
    let (mut x, mut o) = paired(&addr).await;

    // X thinks for well past the idle timeout. O keeps the connection
    // alive with heartbeats, X with plain WebSocket pings.
    for _ in 0..8 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        send_json(&mut o, json!({ "type": "heartbeat" })).await;
        assert_eq!(recv_json(&mut o).await["type"], "heartbeatAck");
        x.send(Message::Ping(Vec::<u8>::new().into())).await.expect("ping");
    }

    place(&mut x, 0, 0).await;
    assert_eq!(recv_json(&mut x).await["type"], "gameState");
    assert_eq!(recv_json(&mut o).await["type"], "gameState");
}

#[tokio::test]
async fn test_heartbeats_keep_a_queued_player_waiting() {
    let addr = start_server(DuelforgeServer::builder().idle_timeout(Duration::from_millis(300))).await;
    let (mut first, _) = join(&addr).await;
    send_json(&mut first, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut first).await["type"], "queued");

    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        send_json(&mut first, json!({ "type": "heartbeat" })).await;
        assert_eq!(recv_json(&mut first).await["type"], "heartbeatAck");
    }

    let (mut second, _) = join(&addr).await;
    send_json(&mut second, json!({ "type": "findMatch", "gameType": "ticTacToe" })).await;
    assert_eq!(recv_json(&mut first).await["type"], "sessionFound");
    assert_eq!(recv_json(&mut second).await["type"], "sessionFound");
}
