//! Session layer for Duelforge.
//!
//! # Key types
//!
//! - [`Coordinator`]: creates sessions, dispatches moves, broadcasts
//!   state, and tears sessions down
//! - [`SessionRegistry`]: active sessions plus the participant index
//! - [`Participant`] / [`Outbound`]: the notification gateway
//! - [`spawn_coordinator`] / [`CoordinatorHandle`]: runs a coordinator
//!   as an actor task
//!
//! # Lifecycle
//!
//! ```text
//! create_session → Active ──(terminal)──→ TerminalPending ──(grace)──→ Ended
//!                     └──────────────(disconnect)──────────────────────↗
//! ```

mod config;
mod coordinator;
mod error;
mod gateway;
mod registry;
mod runtime;
mod session;
mod teardown;

pub use config::{CoordinatorConfig, DEFAULT_TEARDOWN_GRACE_MS};
pub use coordinator::Coordinator;
pub use error::{CoordinatorError, GatewayError};
pub use gateway::{Outbound, Participant, ParticipantSender};
pub use registry::{Rejected, SessionRegistry};
pub use runtime::{CoordinatorHandle, spawn_coordinator};
pub use session::{SeatedParticipant, Session, SessionDraft, SessionPhase};
pub use teardown::{TeardownReceiver, TeardownScheduler};
