//! Wire types: the envelope and the typed payloads it carries.
//!
//! Every frame on the wire is one JSON object:
//!
//! ```json
//! {"type": "chat", "sender": "u-17", "payload": {"message": "hi"}}
//! ```
//!
//! `payload` stays an untyped [`serde_json::Value`] inside the envelope.
//! Chat and signaling payloads are relayed verbatim, so only the
//! component that owns a message type parses its payload (see
//! [`Envelope::payload_as`]).

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ProtocolError;

/// Sender tag on every server-originated envelope.
pub const SERVER_SENDER: &str = "_server";

// ---------------------------------------------------------------------------
// Message kinds
// ---------------------------------------------------------------------------

/// The `type` field of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Text chat, relayed to the whole room.
    Chat,
    /// WebRTC signaling, relayed to the whole room.
    VideoSignal,
    /// Free-form signaling, relayed to the whole room.
    RawSignal,
    /// Game action from a client, or a game snapshot from the server.
    GameState,
    /// Room change request, or the server's join confirmation.
    JoinRoom,
    /// Return to the lobby.
    LeaveRoom,
    /// Member list request and response.
    GetClients,
    /// Room directory request and response.
    GetRooms,
    /// Server-only informational line.
    Status,
    /// Server-only error report.
    Error,
}

impl MessageKind {
    pub const ALL: [MessageKind; 10] = [
        Self::Chat,
        Self::VideoSignal,
        Self::RawSignal,
        Self::GameState,
        Self::JoinRoom,
        Self::LeaveRoom,
        Self::GetClients,
        Self::GetRooms,
        Self::Status,
        Self::Error,
    ];

    /// The wire name, e.g. `"video_signal"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::VideoSignal => "video_signal",
            Self::RawSignal => "raw_signal",
            Self::GameState => "game_state",
            Self::JoinRoom => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::GetClients => "get_clients",
            Self::GetRooms => "get_rooms",
            Self::Status => "status",
            Self::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Kinds fanned out to the room unchanged.
    pub fn is_relayed(self) -> bool {
        matches!(self, Self::Chat | Self::VideoSignal | Self::RawSignal)
    }

    /// Kinds only the server may emit.
    pub fn is_server_only(self) -> bool {
        matches!(self, Self::Status | Self::Error)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The only unit of communication between clients, rooms and the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: MessageKind, payload: Value) -> Self {
        Self {
            kind,
            sender: None,
            payload,
        }
    }

    /// A server-originated envelope with a typed payload.
    pub fn from_server<T: Serialize>(kind: MessageKind, payload: &T) -> Result<Self, ProtocolError> {
        let payload = serde_json::to_value(payload).map_err(ProtocolError::Encode)?;
        Ok(Self::new(kind, payload).with_sender(SERVER_SENDER))
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// `{"type":"status","payload":{"message":...}}`
    pub fn status(message: impl Into<String>) -> Self {
        Self::new(MessageKind::Status, json!({ "message": message.into() }))
            .with_sender(SERVER_SENDER)
    }

    /// `{"type":"error","payload":{"message":...}}`
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, json!({ "message": message.into() }))
            .with_sender(SERVER_SENDER)
    }

    /// Confirmation sent to a client that just entered `room`.
    pub fn room_joined(room: &str) -> Self {
        Self::new(MessageKind::JoinRoom, json!({ "roomName": room })).with_sender(SERVER_SENDER)
    }

    /// Member display names of `room`, in join order.
    pub fn client_list(room: &str, clients: Vec<String>) -> Self {
        Self::new(
            MessageKind::GetClients,
            json!({ "roomName": room, "clients": clients }),
        )
        .with_sender(SERVER_SENDER)
    }

    /// Room directory listing.
    pub fn room_list(rooms: &[RoomSummary]) -> Result<Self, ProtocolError> {
        Self::from_server(MessageKind::GetRooms, &RoomListPayload { rooms: rooms.to_vec() })
    }

    /// Parses the payload as `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        T::deserialize(&self.payload).map_err(|source| ProtocolError::InvalidPayload {
            kind: self.kind.as_str(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Typed payloads
// ---------------------------------------------------------------------------

/// Payload of `status` and `error` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}

/// Payload of `join_room`, both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub room_name: String,
}

/// Payload of a `get_clients` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListPayload {
    pub room_name: String,
    pub clients: Vec<String>,
}

/// One row of the room directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub name: String,
    pub members: usize,
    pub has_game: bool,
}

/// Payload of a `get_rooms` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListPayload {
    pub rooms: Vec<RoomSummary>,
}
