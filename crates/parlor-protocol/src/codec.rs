//! JSON text-frame codec.
//!
//! Outbound envelopes are encoded once and shared as a [`Frame`]: a room
//! broadcast hands the same `Arc<str>` to every member's mailbox instead
//! of re-serializing per recipient.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::{Envelope, MessageKind, ProtocolError};

/// An encoded envelope, ready to be written as a text frame.
pub type Frame = Arc<str>;

/// Serializes an envelope into a shareable text frame.
pub fn encode(envelope: &Envelope) -> Result<Frame, ProtocolError> {
    serde_json::to_string(envelope)
        .map(Frame::from)
        .map_err(ProtocolError::Encode)
}

/// Parses a text frame into an envelope.
///
/// The `type` field is read as a plain string first so that an unknown
/// type is reported as [`ProtocolError::UnknownType`] rather than a
/// generic decode failure.
pub fn decode(text: &str) -> Result<Envelope, ProtocolError> {
    #[derive(Deserialize)]
    struct Wire {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        sender: Option<String>,
        #[serde(default)]
        payload: Value,
    }

    let wire: Wire = serde_json::from_str(text).map_err(ProtocolError::Decode)?;
    let kind = MessageKind::from_name(&wire.kind).ok_or(ProtocolError::UnknownType(wire.kind))?;
    Ok(Envelope {
        kind,
        sender: wire.sender,
        payload: wire.payload,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_chat_envelope() {
        let env = decode(r#"{"type":"chat","payload":{"message":"hi"}}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Chat);
        assert_eq!(env.sender, None);
        assert_eq!(env.payload, json!({"message": "hi"}));
    }

    #[test]
    fn test_decode_unknown_type_reports_name() {
        let err = decode(r#"{"type":"teleport","payload":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(ref name) if name == "teleport"));
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        assert!(matches!(decode("not json at all"), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_type_returns_decode_error() {
        assert!(matches!(decode(r#"{"payload":{}}"#), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_frame_is_json_text() {
        let frame = encode(&Envelope::error("nope")).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["payload"]["message"], "nope");
    }
}
