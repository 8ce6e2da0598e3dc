//! Built-in games for Duelforge.
//!
//! Each module implements [`GameEngine`](duelforge_engine::GameEngine) for
//! one game and exports the `GAME_TYPE` name it is registered under.

pub mod connect_four;
pub mod tictactoe;

use duelforge_engine::EngineRegistry;

pub use connect_four::ConnectFour;
pub use tictactoe::TicTacToe;

/// A registry with every built-in game.
pub fn builtin_engines() -> EngineRegistry {
    EngineRegistry::new()
        .with(tictactoe::GAME_TYPE, TicTacToe::new)
        .with(connect_four::GAME_TYPE, ConnectFour::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelforge_protocol::GameType;

    #[test]
    fn test_builtin_engines_registers_both_games() {
        let engines = builtin_engines();
        assert!(engines.contains(&GameType::new("ticTacToe")));
        assert!(engines.contains(&GameType::new("connectFour")));
        assert_eq!(engines.len(), 2);
    }
}
