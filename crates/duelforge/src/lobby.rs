//! Pairing lobby: first come, first paired, per game type.
//!
//! One participant at most waits per game type. The next participant
//! asking for the same type is paired with the waiter, who takes seat A.

use std::collections::HashMap;

use duelforge_protocol::{GameType, PlayerId};
use duelforge_session::Participant;

/// Errors from lobby operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// The participant is already waiting for a match.
    #[error("player {0} is already queued for {1}")]
    AlreadyQueued(PlayerId, GameType),
}

/// What [`Lobby::enqueue`] did with a participant.
#[derive(Debug)]
pub enum Pairing {
    /// Nobody was waiting; the participant now is.
    Queued,
    /// Someone was waiting and has been taken out of the queue. They are
    /// seat A, the caller seat B.
    Matched(Participant),
}

/// Participants waiting for an opponent.
///
/// Invariant: `waiting` and `queued` always describe the same set of
/// participants.
#[derive(Debug, Default)]
pub struct Lobby {
    /// The waiting participant for each game type.
    waiting: HashMap<GameType, Participant>,
    /// Which game type each waiting participant asked for.
    queued: HashMap<PlayerId, GameType>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `participant` for `game_type`, or pairs them with whoever
    /// is already waiting for it.
    pub fn enqueue(
        &mut self,
        participant: Participant,
        game_type: GameType,
    ) -> Result<Pairing, LobbyError> {
        if let Some(current) = self.queued.get(&participant.id) {
            return Err(LobbyError::AlreadyQueued(participant.id, current.clone()));
        }

        match self.waiting.remove(&game_type) {
            Some(waiter) => {
                self.queued.remove(&waiter.id);
                tracing::info!(
                    %game_type,
                    player_a = %waiter.id,
                    player_b = %participant.id,
                    "players paired"
                );
                Ok(Pairing::Matched(waiter))
            }
            None => {
                tracing::debug!(%game_type, player_id = %participant.id, "player queued");
                self.queued.insert(participant.id, game_type.clone());
                self.waiting.insert(game_type, participant);
                Ok(Pairing::Queued)
            }
        }
    }

    /// Takes a participant out of the queue. Returns the game type they
    /// were waiting for, if any.
    pub fn remove(&mut self, player: PlayerId) -> Option<GameType> {
        let game_type = self.queued.remove(&player)?;
        self.waiting.remove(&game_type);
        tracing::debug!(%game_type, player_id = %player, "player left the queue");
        Some(game_type)
    }

    pub fn is_queued(&self, player: PlayerId) -> bool {
        self.queued.contains_key(&player)
    }

    /// Number of waiting participants.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn participant(id: u64) -> Participant {
        Participant::new(PlayerId(id), mpsc::unbounded_channel().0)
    }

    fn ttt() -> GameType {
        GameType::new("ticTacToe")
    }

    #[test]
    fn test_first_player_is_queued() {
        let mut lobby = Lobby::new();
        let result = lobby.enqueue(participant(1), ttt()).unwrap();
        assert!(matches!(result, Pairing::Queued));
        assert!(lobby.is_queued(PlayerId(1)));
        assert_eq!(lobby.len(), 1);
    }

    #[test]
    fn test_second_player_is_matched_with_waiter() {
        let mut lobby = Lobby::new();
        lobby.enqueue(participant(1), ttt()).unwrap();

        match lobby.enqueue(participant(2), ttt()).unwrap() {
            Pairing::Matched(waiter) => assert_eq!(waiter.id, PlayerId(1)),
            other => panic!("expected a match, got {other:?}"),
        }
        assert!(lobby.is_empty());
        assert!(!lobby.is_queued(PlayerId(1)));
        assert!(!lobby.is_queued(PlayerId(2)));
    }

    #[test]
    fn test_different_game_types_do_not_pair() {
        let mut lobby = Lobby::new();
        lobby.enqueue(participant(1), ttt()).unwrap();
        let result = lobby
            .enqueue(participant(2), GameType::new("connectFour"))
            .unwrap();

        assert!(matches!(result, Pairing::Queued));
        assert_eq!(lobby.len(), 2);
    }

    #[test]
    fn test_queueing_twice_is_rejected() {
        let mut lobby = Lobby::new();
        lobby.enqueue(participant(1), ttt()).unwrap();

        let err = lobby
            .enqueue(participant(1), GameType::new("connectFour"))
            .unwrap_err();
        assert_eq!(err, LobbyError::AlreadyQueued(PlayerId(1), ttt()));
        assert_eq!(lobby.len(), 1);
    }

    #[test]
    fn test_remove_frees_the_slot() {
        let mut lobby = Lobby::new();
        lobby.enqueue(participant(1), ttt()).unwrap();

        assert_eq!(lobby.remove(PlayerId(1)), Some(ttt()));
        assert_eq!(lobby.remove(PlayerId(1)), None);

        // Player 2 now waits instead of being paired with a ghost.
        let result = lobby.enqueue(participant(2), ttt()).unwrap();
        assert!(matches!(result, Pairing::Queued));
    }
}
