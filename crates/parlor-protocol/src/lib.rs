//! Wire protocol for Parlor.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`Envelope`], [`MessageKind`] and the typed payloads):
//!   the JSON objects that travel in WebSocket text frames.
//! - **Codec** ([`encode`], [`decode`]): conversion between envelopes
//!   and text frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! The protocol layer knows nothing about connections, rooms or games.
//!
//! ```text
//! Transport (text frame) → Protocol (Envelope) → Room / Hub
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Frame, decode, encode};
pub use error::ProtocolError;
pub use types::{
    ClientListPayload, Envelope, MessageKind, MessagePayload, RoomListPayload, RoomPayload,
    RoomSummary, SERVER_SENDER,
};
