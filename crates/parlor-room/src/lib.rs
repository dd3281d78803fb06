//! Rooms for Parlor.
//!
//! A [`Room`] owns its members and at most one game behind a single
//! lock. Members are [`Member`] handles: an identity plus a bounded
//! mailbox that broadcasts write into without ever waiting.
//!
//! # Key types
//!
//! - [`Room`]: membership, relay, game actions, tick loop
//! - [`Member`]: the room-facing side of a connected client
//! - [`GameCommand`]: the `game_state` request payload
//! - [`RoomConfig`]: tick interval and game timings

mod command;
mod config;
mod error;
mod member;
mod room;

pub use command::{GameAction, GameCommand};
pub use config::RoomConfig;
pub use error::RoomError;
pub use member::Member;
pub use room::{LOBBY, Room};
