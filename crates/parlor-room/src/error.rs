//! Error types for the room layer.

use parlor_game::GameError;
use parlor_protocol::ProtocolError;

/// Errors returned to the member whose request caused them.
///
/// None of these mutate the room; the caller reports them back as an
/// `error` envelope.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The action needs a game but the room has none.
    #[error("no game in this room")]
    NoGame,

    /// `create` while a game already exists.
    #[error("a game already exists in this room")]
    GameExists,

    /// The `action` field named something we do not handle.
    #[error("unknown game action: {0}")]
    UnknownAction(String),

    /// A required payload field was absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The game engine refused the action.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The payload could not be decoded or a reply could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
