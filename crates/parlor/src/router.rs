//! Delivery of room-scoped envelopes.

use parlor_protocol::{Envelope, MessageKind};
use parlor_room::{Member, Room};
use tracing::{debug, warn};

/// Handles an envelope whose target is the sender's current room.
///
/// Rule and payload errors go back to the sender only.
pub(crate) async fn to_room(room: &Room, member: &Member, envelope: &Envelope) {
    let result = match envelope.kind {
        kind if kind.is_relayed() => room.relay(envelope).await,
        MessageKind::GameState => room.dispatch_game_action(member, envelope).await,
        MessageKind::GetClients => {
            member.send(&room.client_list().await);
            Ok(())
        }
        kind => {
            debug!(room = %room.name(), %kind, "not a room message");
            return;
        }
    };
    if let Err(e) = result {
        warn!(room = %room.name(), client = %member.id(), kind = %envelope.kind, error = %e, "request rejected");
        member.send(&Envelope::error(e.to_string()));
    }
}
