//! Unified error type for Parlor.

use parlor_game::GameError;
use parlor_protocol::ProtocolError;
use parlor_room::RoomError;
use parlor_session::SessionError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (credentials, token table).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (missing game, bad action).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game rule violation.
    #[error(transparent)]
    Game(#[from] GameError),

    /// An environment variable held a value that does not parse.
    #[error("invalid value for {key}: {value:?}")]
    Config { key: String, value: String },

    /// The hub loop has stopped.
    #[error("hub is not running")]
    HubClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Transport(_)));
        assert!(parlor_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownType("teleport".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AuthFailed("nope".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let parlor_err: ParlorError = RoomError::NoGame.into();
        assert!(matches!(parlor_err, ParlorError::Room(_)));
    }

    #[test]
    fn test_from_game_error_keeps_message() {
        let parlor_err: ParlorError = GameError::NotYourTurn.into();
        assert_eq!(parlor_err.to_string(), "not your turn");
    }

    #[test]
    fn test_config_error_display() {
        let err = ParlorError::Config {
            key: "PARLOR_MAILBOX_CAPACITY".into(),
            value: "lots".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for PARLOR_MAILBOX_CAPACITY: \"lots\""
        );
    }
}
