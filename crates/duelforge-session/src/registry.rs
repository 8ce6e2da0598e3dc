//! Session registry: the active sessions and the participant index.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a pair of plain `HashMap`s and is not thread-safe
//! on its own. It is owned by exactly one [`Coordinator`](crate::Coordinator),
//! which in turn is driven by a single task, so every mutation happens one
//! event at a time.

use std::collections::HashMap;

use duelforge_protocol::{PlayerId, SessionId};
use rand::Rng;

use crate::{CoordinatorError, Session, SessionDraft, SessionPhase};

/// A registration the registry refused. Carries the draft back so the
/// caller still owns (and must release) its engine.
#[derive(Debug)]
pub struct Rejected {
    pub error: CoordinatorError,
    pub draft: SessionDraft,
}

/// Owns every active session and indexes them by participant.
///
/// Invariant: a participant maps to at most one session, and a session's
/// two index entries are inserted and removed together.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    participants: HashMap<PlayerId, SessionId>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new session and indexes both participants.
    ///
    /// The registry rejects the draft if either participant already has
    /// an active session, or if both seats hold the same participant.
    /// On success the session is `Active`.
    pub fn register(&mut self, draft: SessionDraft) -> Result<SessionId, Rejected> {
        let [a, b] = [draft.seats[0].id(), draft.seats[1].id()];
        if a == b {
            return Err(Rejected {
                error: CoordinatorError::SameParticipant(a),
                draft,
            });
        }
        for player in [a, b] {
            if self.participants.contains_key(&player) {
                return Err(Rejected {
                    error: CoordinatorError::AlreadyInSession(player),
                    draft,
                });
            }
        }

        let id = self.fresh_id();
        let mut session = Session::from_draft(id.clone(), draft);
        session.advance(SessionPhase::Active);

        self.participants.insert(a, id.clone());
        self.participants.insert(b, id.clone());
        self.sessions.insert(id.clone(), session);

        tracing::info!(session_id = %id, player_a = %a, player_b = %b, "session registered");
        Ok(id)
    }

    /// Looks up a session by its identifier.
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Looks up the session a participant is in.
    pub fn lookup_by_participant(&self, player: &PlayerId) -> Option<&Session> {
        self.participants
            .get(player)
            .and_then(|id| self.sessions.get(id))
    }

    /// The identifier of the session a participant is in.
    pub fn session_of(&self, player: &PlayerId) -> Option<&SessionId> {
        self.participants.get(player)
    }

    /// Removes a session and both of its index entries.
    ///
    /// Returns the removed session, or `None` if it was already gone.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        for player in session.player_ids() {
            self.participants.remove(&player);
        }
        tracing::info!(session_id = %id, "session removed");
        Some(session)
    }

    /// Returns `true` if the participant has an active session.
    pub fn is_active(&self, player: &PlayerId) -> bool {
        self.participants.contains_key(player)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Identifiers of all active sessions.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    /// Generates an identifier no live session is using.
    fn fresh_id(&self) -> SessionId {
        loop {
            let id = generate_session_id();
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Generates a random 32-character hex identifier (128 bits).
fn generate_session_id() -> SessionId {
    let bytes: [u8; 16] = rand::rng().random();
    SessionId::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}
