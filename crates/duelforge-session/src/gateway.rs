//! Notification gateway: the outbound edge of the session layer.
//!
//! The coordinator only ever *sends* to a participant. How the bytes reach
//! the client is the transport's business; all the coordinator needs is
//! something implementing [`Outbound`].

use std::fmt;
use std::sync::Arc;

use duelforge_protocol::{PlayerId, ServerMessage};
use tokio::sync::mpsc;

use crate::GatewayError;

/// A participant's outbound channel.
///
/// Send-or-fail: no retry, no acknowledgement. A failed delivery usually
/// means the connection is already gone and its disconnect event is on
/// the way.
pub trait Outbound: Send + Sync + 'static {
    fn deliver(&self, msg: &ServerMessage) -> Result<(), GatewayError>;

    /// Returns `true` once nothing can be delivered any more.
    fn is_closed(&self) -> bool {
        false
    }
}

impl Outbound for mpsc::UnboundedSender<ServerMessage> {
    fn deliver(&self, msg: &ServerMessage) -> Result<(), GatewayError> {
        self.send(msg.clone()).map_err(|_| GatewayError::ChannelClosed)
    }

    fn is_closed(&self) -> bool {
        mpsc::UnboundedSender::is_closed(self)
    }
}

/// Channel sender for delivering server messages to one connection.
pub type ParticipantSender = mpsc::UnboundedSender<ServerMessage>;

/// A participant as the pairing layer hands it to the coordinator: an
/// identity plus somewhere to send messages.
#[derive(Clone)]
pub struct Participant {
    pub id: PlayerId,
    outbound: Arc<dyn Outbound>,
}

impl Participant {
    pub fn new(id: PlayerId, outbound: impl Outbound) -> Self {
        Self {
            id,
            outbound: Arc::new(outbound),
        }
    }

    /// Returns `false` once the participant's channel is closed.
    pub fn is_connected(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Sends `msg` to this participant. Failures are logged and dropped.
    pub fn notify(&self, msg: &ServerMessage) {
        if let Err(e) = self.outbound.deliver(msg) {
            tracing::debug!(player_id = %self.id, error = %e, "dropping outbound message");
        }
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant").field("id", &self.id).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_delivers_to_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let p = Participant::new(PlayerId(1), tx);

        p.notify(&ServerMessage::OpponentDisconnected);

        assert_eq!(rx.try_recv().unwrap(), ServerMessage::OpponentDisconnected);
    }

    #[test]
    fn test_deliver_to_closed_channel_fails() {
        let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();
        drop(rx);

        let result = tx.deliver(&ServerMessage::OpponentDisconnected);
        assert_eq!(result, Err(GatewayError::ChannelClosed));
    }

    #[test]
    fn test_is_connected_follows_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let p = Participant::new(PlayerId(1), tx);
        assert!(p.is_connected());

        drop(rx);
        assert!(!p.is_connected());
    }

    #[test]
    fn test_notify_closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let p = Participant::new(PlayerId(1), tx);
        p.notify(&ServerMessage::OpponentDisconnected);
    }
}
