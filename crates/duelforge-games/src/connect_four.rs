//! Connect-four: 6 rows × 7 columns, discs drop to the lowest free row.
//!
//! Seat A plays `Red` and opens; seat B plays `Yellow`. Moves are
//! `{"column": c}` with `c` in `0..7`. The snapshot board is indexed
//! top row first.

use duelforge_engine::{GameEngine, MoveOutcome, RejectReason, Seat, Snapshot};
use duelforge_protocol::{PlayerId, Role};
use serde::Deserialize;
use serde_json::{Value, json};

/// Registry name for this game.
pub const GAME_TYPE: &str = "connectFour";

const ROWS: usize = 6;
const COLS: usize = 7;
const LINE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disc {
    Red,
    Yellow,
}

impl Disc {
    fn symbol(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Yellow => "Yellow",
        }
    }

    fn of(seat: Seat) -> Self {
        match seat {
            Seat::A => Self::Red,
            Seat::B => Self::Yellow,
        }
    }
}

#[derive(Deserialize)]
struct DropDisc {
    column: usize,
}

type Grid = [[Option<Disc>; COLS]; ROWS];

/// Engine state for one connect-four game.
#[derive(Debug, Default)]
pub struct ConnectFour {
    grid: Grid,
    players: Option<[PlayerId; 2]>,
    turn: Option<Seat>,
    winner: Option<Disc>,
    draw: bool,
}

impl ConnectFour {
    pub fn new() -> Self {
        Self::default()
    }

    fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        let [a, b] = self.players?;
        match player {
            p if p == a => Some(Seat::A),
            p if p == b => Some(Seat::B),
            _ => None,
        }
    }

    /// Lowest empty row in `col`, counting from the top.
    fn landing_row(&self, col: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&row| self.grid[row][col].is_none())
    }
}

impl GameEngine for ConnectFour {
    fn initialize(&mut self, players: [PlayerId; 2]) -> [Role; 2] {
        self.players = Some(players);
        self.turn = Some(self.opening_seat());
        [Role::new(Disc::Red.symbol()), Role::new(Disc::Yellow.symbol())]
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
        let mv: DropDisc = match serde_json::from_value(data.clone()) {
            Ok(d) => d,
            Err(e) => return MoveOutcome::Rejected(RejectReason::Malformed(e.to_string())),
        };
        if mv.column >= COLS {
            return MoveOutcome::Rejected(RejectReason::IllegalPosition(format!(
                "column must be 0-{}",
                COLS - 1
            )));
        }
        let Some(row) = self.landing_row(mv.column) else {
            return MoveOutcome::Rejected(RejectReason::Occupied(format!(
                "column {}",
                mv.column
            )));
        };

        let disc = Disc::of(seat);
        self.grid[row][mv.column] = Some(disc);

        if completes_line(&self.grid, row, mv.column, disc) {
            self.winner = Some(disc);
            self.turn = None;
        } else if self.grid[0].iter().all(Option::is_some) {
            self.draw = true;
            self.turn = None;
        } else {
            self.turn = Some(seat.opposite());
        }
        MoveOutcome::Accepted
    }

    fn snapshot(&self) -> Snapshot {
        let board = self
            .grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map_or(Value::Null, |d| json!(d.symbol())))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        Snapshot {
            board: json!(board),
            current_turn: self.turn.map(|s| Role::new(Disc::of(s).symbol())),
            winner: self.winner.map(|d| Role::new(d.symbol())),
            is_draw: self.draw,
        }
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.draw
    }

    fn board_shape(&self) -> Option<Value> {
        Some(json!({ "rows": ROWS, "cols": COLS, "connect": LINE }))
    }
}

/// Checks the four line directions through the disc just placed.
fn completes_line(grid: &Grid, row: usize, col: usize, disc: Disc) -> bool {
    const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

    let count = |dr: isize, dc: isize| -> usize {
        let mut n = 0;
        let (mut r, mut c) = (row as isize + dr, col as isize + dc);
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && grid[r as usize][c as usize] == Some(disc)
        {
            n += 1;
            r += dr;
            c += dc;
        }
        n
    };

    DIRECTIONS
        .iter()
        .any(|&(dr, dc)| 1 + count(dr, dc) + count(-dr, -dc) >= LINE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> ConnectFour {
        let mut g = ConnectFour::new();
        g.initialize([PlayerId(1), PlayerId(2)]);
        g
    }

    fn drop_in(g: &mut ConnectFour, who: u64, column: usize) -> MoveOutcome {
        g.apply_move(PlayerId(who), &json!({ "column": column }))
    }

    #[test]
    fn test_disc_lands_on_bottom_row() {
        let mut g = game();
        assert!(drop_in(&mut g, 1, 3).is_accepted());
        let board = g.snapshot().board;
        assert_eq!(board[ROWS - 1][3], "Red");
        assert!(board[ROWS - 2][3].is_null());
    }

    #[test]
    fn test_vertical_win() {
        let mut g = game();
        for _ in 0..3 {
            drop_in(&mut g, 1, 0);
            drop_in(&mut g, 2, 1);
        }
        assert!(drop_in(&mut g, 1, 0).is_accepted());
        assert!(g.is_terminal());
        assert_eq!(g.snapshot().winner, Some(Role::new("Red")));
    }

    #[test]
    fn test_horizontal_win_for_second_player() {
        let mut g = game();
        // Red scatters on the right, Yellow builds along the bottom.
        drop_in(&mut g, 1, 6);
        drop_in(&mut g, 2, 0);
        drop_in(&mut g, 1, 6);
        drop_in(&mut g, 2, 1);
        drop_in(&mut g, 1, 5);
        drop_in(&mut g, 2, 2);
        drop_in(&mut g, 1, 5);
        assert!(!g.is_terminal());
        drop_in(&mut g, 2, 3);
        assert_eq!(g.snapshot().winner, Some(Role::new("Yellow")));
    }

    #[test]
    fn test_full_column_is_occupied() {
        let mut g = game();
        for i in 0..ROWS {
            let who = if i % 2 == 0 { 1 } else { 2 };
            assert!(drop_in(&mut g, who, 2).is_accepted());
        }
        let r = drop_in(&mut g, 1, 2);
        assert!(matches!(r, MoveOutcome::Rejected(RejectReason::Occupied(_))));
    }

    #[test]
    fn test_column_out_of_range() {
        let mut g = game();
        assert!(matches!(
            drop_in(&mut g, 1, COLS),
            MoveOutcome::Rejected(RejectReason::IllegalPosition(_))
        ));
    }

    #[test]
    fn test_wrong_turn_rejected() {
        let mut g = game();
        assert_eq!(drop_in(&mut g, 2, 0), MoveOutcome::Rejected(RejectReason::NotYourTurn));
    }

    #[test]
    fn test_diagonal_line_detection() {
        let mut grid: Grid = [[None; COLS]; ROWS];
        for i in 0..LINE {
            grid[ROWS - 1 - i][i] = Some(Disc::Red);
        }
        assert!(completes_line(&grid, ROWS - 1, 0, Disc::Red));
        assert!(completes_line(&grid, ROWS - 3, 2, Disc::Red));
        assert!(!completes_line(&grid, ROWS - 1, 0, Disc::Yellow));
    }
}
