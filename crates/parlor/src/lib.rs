//! # Parlor
//!
//! Real-time rooms and turn-based board games over WebSocket.
//!
//! Authenticated clients connect, start in the lobby, move between named
//! rooms, chat and relay signaling messages, and play tic-tac-toe,
//! connect four or chess against another member of their room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn start() -> Result<(), ParlorError> {
//! let tokens = TokenTable::parse("secret=u1:Alice")?;
//! let server = ParlorServerBuilder::new()
//!     .config(ServerConfig::from_env()?)
//!     .build(tokens)
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod client;
mod config;
mod error;
pub mod hub;
mod router;
mod server;

pub use config::{
    ConnectionConfig, DEFAULT_BIND_ADDR, DEFAULT_EVENT_BUFFER, DEFAULT_MAILBOX_CAPACITY,
    DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PING_INTERVAL, DEFAULT_PING_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
    HubConfig, ServerConfig,
};
pub use error::ParlorError;
pub use hub::{Hub, HubHandle, Registration};
pub use server::{ParlorServer, ParlorServerBuilder};

/// Everything needed to run a server or drive the hub directly.
pub mod prelude {
    pub use crate::{
        ConnectionConfig, Hub, HubConfig, HubHandle, ParlorError, ParlorServer,
        ParlorServerBuilder, Registration, ServerConfig,
    };
    pub use parlor_game::{GameRegistry, GameSnapshot, GameStatus, GameTimings};
    pub use parlor_protocol::{Envelope, MessageKind, RoomSummary};
    pub use parlor_room::{LOBBY, Member, RoomConfig};
    pub use parlor_session::{Authenticator, Identity, SessionError, TokenTable};
    pub use parlor_transport::ConnectionId;
}
