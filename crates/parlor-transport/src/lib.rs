//! Transport abstraction layer for Parlor.
//!
//! Provides the [`Connection`] trait the client pumps are written
//! against, and a WebSocket implementation whose upgrade step runs an
//! admission check on the HTTP request before the connection exists.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_MAX_FRAME_SIZE, PendingConnection, TransportConfig, WebSocketConnection,
    WebSocketTransport,
};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A data frame received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text(String),
    Binary(Vec<u8>),
}

impl Incoming {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The parts of an HTTP upgrade request an admission check may inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub cookie: Option<String>,
}

/// A single bidirectional message connection.
///
/// Methods return `Send` futures so pumps written against this trait can
/// be spawned onto the multi-threaded runtime.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one text frame.
    fn send_text(&self, text: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next data frame.
    ///
    /// Returns `Ok(None)` on a normal or going-away close and at end of
    /// stream. Control frames are handled internally and never returned.
    fn recv(&self) -> impl Future<Output = Result<Option<Incoming>, Self::Error>> + Send;

    /// Sends a ping and resolves once the peer answers.
    ///
    /// Only resolves while another task is driving [`recv`](Self::recv);
    /// callers apply their own deadline.
    fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
