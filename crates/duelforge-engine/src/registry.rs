//! Engine registry: maps a game-type identifier to an engine factory.

use std::collections::HashMap;
use std::fmt;

use duelforge_protocol::GameType;

use crate::GameEngine;

/// Builds a fresh engine for one session.
pub type EngineFactory = Box<dyn Fn() -> Box<dyn GameEngine> + Send + Sync>;

/// The set of games a coordinator can host.
///
/// Built once at startup and handed to the coordinator, which owns it from
/// then on. Adding a game means registering another factory here; the
/// coordinator itself never changes.
#[derive(Default)]
pub struct EngineRegistry {
    factories: HashMap<GameType, EngineFactory>,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `game_type`, replacing any previous
    /// factory for the same type.
    pub fn register<F, E>(&mut self, game_type: impl Into<GameType>, factory: F)
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: GameEngine,
    {
        let game_type = game_type.into();
        tracing::debug!(%game_type, "engine registered");
        self.factories.insert(
            game_type,
            Box::new(move || Box::new(factory()) as Box<dyn GameEngine>),
        );
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F, E>(mut self, game_type: impl Into<GameType>, factory: F) -> Self
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: GameEngine,
    {
        self.register(game_type, factory);
        self
    }

    /// Builds a new engine for `game_type`, or `None` if nothing is
    /// registered under that name.
    pub fn instantiate(&self, game_type: &GameType) -> Option<Box<dyn GameEngine>> {
        self.factories.get(game_type).map(|factory| factory())
    }

    /// Returns `true` if `game_type` has a factory.
    pub fn contains(&self, game_type: &GameType) -> bool {
        self.factories.contains_key(game_type)
    }

    /// All registered game types, sorted for stable output.
    pub fn game_types(&self) -> Vec<GameType> {
        let mut types: Vec<GameType> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("game_types", &self.game_types())
            .finish()
    }
}
