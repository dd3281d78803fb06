//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the problem is in the shape of a
//! message, never in networking or game rules. The offending client gets
//! an error envelope back and its connection stays open.

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an envelope or payload into JSON).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The frame is not a JSON envelope: malformed JSON, missing `type`,
    /// or wrong field types.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope's `type` is not one we know.
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// The payload does not match what the message type requires.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The envelope is well formed but not allowed in this direction,
    /// e.g. a client sending a `status` message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_display_names_type() {
        let err = ProtocolError::UnknownType("teleport".into());
        assert_eq!(err.to_string(), "Unknown message type: teleport");
    }

    #[test]
    fn test_invalid_payload_display_names_kind() {
        let source = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        let err = ProtocolError::InvalidPayload { kind: "join_room", source };
        assert!(err.to_string().starts_with("invalid join_room payload"));
    }
}
