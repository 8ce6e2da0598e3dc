//! Tic-tac-toe on a 3×3 board.
//!
//! Seat A plays `X` and opens; seat B plays `O`. Moves are
//! `{"row": r, "col": c}` with both coordinates in `0..3`.

use duelforge_engine::{GameEngine, MoveOutcome, RejectReason, Seat, Snapshot};
use duelforge_protocol::{PlayerId, Role};
use serde::Deserialize;
use serde_json::{Value, json};

/// Registry name for this game.
pub const GAME_TYPE: &str = "ticTacToe";

const SIZE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    X,
    O,
}

impl Mark {
    fn symbol(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }

    fn of(seat: Seat) -> Self {
        match seat {
            Seat::A => Self::X,
            Seat::B => Self::O,
        }
    }
}

#[derive(Deserialize)]
struct Placement {
    row: usize,
    col: usize,
}

/// Engine state for one tic-tac-toe game.
#[derive(Debug, Default)]
pub struct TicTacToe {
    board: [[Option<Mark>; SIZE]; SIZE],
    players: Option<[PlayerId; 2]>,
    turn: Option<Seat>,
    winner: Option<Mark>,
    draw: bool,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        let players = self.players?;
        if players[0] == player {
            Some(Seat::A)
        } else if players[1] == player {
            Some(Seat::B)
        } else {
            None
        }
    }

    fn board_json(&self) -> Value {
        let rows: Vec<Value> = self
            .board
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map_or(Value::Null, |m| json!(m.symbol())))
                    .collect()
            })
            .collect();
        Value::Array(rows)
    }
}

impl GameEngine for TicTacToe {
    fn initialize(&mut self, players: [PlayerId; 2]) -> [Role; 2] {
        self.players = Some(players);
        self.turn = Some(self.opening_seat());
        [Role::new(Mark::X.symbol()), Role::new(Mark::O.symbol())]
    }

    fn apply_move(&mut self, player: PlayerId, data: &Value) -> MoveOutcome {
        if self.is_terminal() {
            return MoveOutcome::Rejected(RejectReason::GameOver);
        }
        let Some(seat) = self.seat_of(player) else {
            return MoveOutcome::Rejected(RejectReason::NotSeated(player));
        };
        if self.turn != Some(seat) {
            return MoveOutcome::Rejected(RejectReason::NotYourTurn);
        }
        let placement: Placement = match serde_json::from_value(data.clone()) {
            Ok(p) => p,
            Err(e) => return MoveOutcome::Rejected(RejectReason::Malformed(e.to_string())),
        };
        if placement.row >= SIZE || placement.col >= SIZE {
            return MoveOutcome::Rejected(RejectReason::IllegalPosition(
                "row and col must be 0-2".into(),
            ));
        }
        if self.board[placement.row][placement.col].is_some() {
            return MoveOutcome::Rejected(RejectReason::Occupied(format!(
                "cell ({}, {})",
                placement.row, placement.col
            )));
        }

        let mark = Mark::of(seat);
        self.board[placement.row][placement.col] = Some(mark);

        if check_winner(&self.board, mark) {
            self.winner = Some(mark);
            self.turn = None;
        } else if board_full(&self.board) {
            self.draw = true;
            self.turn = None;
        } else {
            self.turn = Some(seat.opposite());
        }
        MoveOutcome::Accepted
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board_json(),
            current_turn: self.turn.map(|s| Role::new(Mark::of(s).symbol())),
            winner: self.winner.map(|m| Role::new(m.symbol())),
            is_draw: self.draw,
        }
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.draw
    }

    fn board_shape(&self) -> Option<Value> {
        Some(json!({ "rows": SIZE, "cols": SIZE }))
    }
}

fn check_winner(b: &[[Option<Mark>; SIZE]; SIZE], m: Mark) -> bool {
    let m = Some(m);
    (0..SIZE).any(|i| (0..SIZE).all(|j| b[i][j] == m))             // rows
        || (0..SIZE).any(|j| (0..SIZE).all(|i| b[i][j] == m))      // cols
        || (0..SIZE).all(|i| b[i][i] == m)                          // diagonal
        || (0..SIZE).all(|i| b[i][SIZE - 1 - i] == m)               // anti-diagonal
}

fn board_full(b: &[[Option<Mark>; SIZE]; SIZE]) -> bool {
    b.iter().all(|row| row.iter().all(Option::is_some))
}
