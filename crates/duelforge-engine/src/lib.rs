//! Game-engine contract for Duelforge.
//!
//! # Key types
//!
//! - [`GameEngine`]: the trait each game implements
//! - [`MoveOutcome`] / [`RejectReason`]: classified result of a move
//! - [`Snapshot`]: value copy of an engine's state
//! - [`EngineRegistry`]: game type → engine factory

mod engine;
mod error;
mod registry;

pub use engine::{GameEngine, MoveOutcome, Seat, Snapshot};
pub use error::RejectReason;
pub use registry::{EngineFactory, EngineRegistry};
