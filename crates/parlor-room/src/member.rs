//! The room-facing handle of a connected client.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use parlor_protocol::{Envelope, Frame, encode};
use parlor_session::Identity;
use parlor_transport::ConnectionId;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::Room;

/// A client as seen by the room it sits in.
///
/// Rooms hold `Arc<Member>`; the member only holds a weak reference back
/// to its room, so dropping a room never leaks through its members.
#[derive(Debug)]
pub struct Member {
    id: ConnectionId,
    identity: Identity,
    mailbox: mpsc::Sender<Frame>,
    room: RwLock<Weak<Room>>,
}

impl Member {
    pub fn new(id: ConnectionId, identity: Identity, mailbox: mpsc::Sender<Frame>) -> Self {
        Self {
            id,
            identity,
            mailbox,
            room: RwLock::new(Weak::new()),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    /// The room this member currently sits in, if it is still alive.
    pub fn room(&self) -> Option<Arc<Room>> {
        self.room
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    pub(crate) fn set_room(&self, room: &Arc<Room>) {
        *self.room.write().unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(room);
    }

    /// Clears the back-reference, but only if it still points at `room`.
    pub(crate) fn clear_room(&self, room: &Room) {
        let mut current = self.room.write().unwrap_or_else(PoisonError::into_inner);
        if std::ptr::eq(current.as_ptr(), room) {
            *current = Weak::new();
        }
    }

    /// Queues an encoded frame without waiting.
    ///
    /// A full mailbox drops the frame. Returns whether it was queued.
    pub fn deliver(&self, frame: &Frame) -> bool {
        match self.mailbox.try_send(Arc::clone(frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(client = %self.id, user = %self.identity.user_id, "mailbox full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(client = %self.id, "mailbox closed, dropping message");
                false
            }
        }
    }

    /// Encodes and queues one envelope for this member only.
    pub fn send(&self, envelope: &Envelope) -> bool {
        match encode(envelope) {
            Ok(frame) => self.deliver(&frame),
            Err(e) => {
                tracing::error!(client = %self.id, error = %e, "failed to encode envelope");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(capacity: usize) -> (Member, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        let member = Member::new(ConnectionId::new(1), Identity::new("u1", "Alice"), tx);
        (member, rx)
    }

    #[test]
    fn test_deliver_full_mailbox_drops() {
        let (member, mut rx) = member(1);
        let frame: Frame = Arc::from("one");
        assert!(member.deliver(&frame));
        assert!(!member.deliver(&Arc::from("two")));

        assert_eq!(&*rx.try_recv().unwrap(), "one");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_deliver_closed_mailbox_returns_false() {
        let (member, rx) = member(4);
        drop(rx);
        assert!(!member.deliver(&Arc::from("lost")));
    }

    #[test]
    fn test_send_encodes_envelope() {
        let (member, mut rx) = member(4);
        assert!(member.send(&Envelope::status("hi")));
        let frame = rx.try_recv().unwrap();
        assert!(frame.contains(r#""type":"status""#));
    }

    #[test]
    fn test_room_none_before_first_join() {
        let (member, _rx) = member(1);
        assert!(member.room().is_none());
        assert_eq!(member.display_name(), "Alice");
    }
}
