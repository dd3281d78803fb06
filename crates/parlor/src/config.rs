//! Server configuration.
//!
//! Every setting has a named default. [`ServerConfig::from_env`] reads
//! `PARLOR_*` overrides:
//!
//! | variable | field |
//! |---|---|
//! | `PARLOR_BIND_ADDR` | `bind_addr` |
//! | `PARLOR_WRITE_TIMEOUT_SECS` | `connection.write_timeout` |
//! | `PARLOR_PING_INTERVAL_SECS` | `connection.ping_interval` |
//! | `PARLOR_PING_TIMEOUT_SECS` | `connection.ping_timeout` |
//! | `PARLOR_MAX_MESSAGE_SIZE` | `connection.max_message_size` |
//! | `PARLOR_MAX_FRAME_SIZE` | `connection.max_frame_size` |
//! | `PARLOR_MAILBOX_CAPACITY` | `connection.mailbox_capacity` |
//! | `PARLOR_EVENT_BUFFER` | `hub.event_buffer` |
//! | `PARLOR_RECONNECT_GRACE_SECS` | `room.timings.reconnect_grace` |
//! | `PARLOR_CLEANUP_DELAY_SECS` | `room.timings.cleanup_delay` |
//!
//! The room tick interval is fixed.

use std::str::FromStr;
use std::time::Duration;

use parlor_room::RoomConfig;
use parlor_transport::DEFAULT_MAX_FRAME_SIZE;

use crate::ParlorError;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);
/// Text frames above this size get an error reply; the connection stays up.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Per-connection limits and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub write_timeout: Duration,
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub max_message_size: usize,
    /// Hard limit enforced by the WebSocket codec. Frames above it end
    /// the connection.
    pub max_frame_size: usize,
    /// Outbound frames queued per client before new ones are dropped.
    pub mailbox_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Capacity of the hub's event queue.
    pub event_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub connection: ConnectionConfig,
    pub hub: HubConfig,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            connection: ConnectionConfig::default(),
            hub: HubConfig::default(),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PARLOR_*` environment variables.
    pub fn from_env() -> Result<Self, ParlorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ParlorError> {
        let env = Env(lookup);
        let defaults = Self::default();
        let timings = defaults.room.timings;

        let config = Self {
            bind_addr: env.get("PARLOR_BIND_ADDR").unwrap_or(defaults.bind_addr),
            connection: ConnectionConfig {
                write_timeout: env.secs_or("PARLOR_WRITE_TIMEOUT_SECS", DEFAULT_WRITE_TIMEOUT)?,
                ping_interval: env.secs_or("PARLOR_PING_INTERVAL_SECS", DEFAULT_PING_INTERVAL)?,
                ping_timeout: env.secs_or("PARLOR_PING_TIMEOUT_SECS", DEFAULT_PING_TIMEOUT)?,
                max_message_size: env.nonzero_or("PARLOR_MAX_MESSAGE_SIZE", DEFAULT_MAX_MESSAGE_SIZE)?,
                max_frame_size: env.nonzero_or("PARLOR_MAX_FRAME_SIZE", DEFAULT_MAX_FRAME_SIZE)?,
                mailbox_capacity: env.nonzero_or("PARLOR_MAILBOX_CAPACITY", DEFAULT_MAILBOX_CAPACITY)?,
            },
            hub: HubConfig {
                event_buffer: env.nonzero_or("PARLOR_EVENT_BUFFER", DEFAULT_EVENT_BUFFER)?,
            },
            room: RoomConfig {
                timings: parlor_game::GameTimings {
                    reconnect_grace: env.secs_or("PARLOR_RECONNECT_GRACE_SECS", timings.reconnect_grace)?,
                    cleanup_delay: env.secs_or("PARLOR_CLEANUP_DELAY_SECS", timings.cleanup_delay)?,
                },
                ..defaults.room
            },
        };
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ParlorError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ParlorError::Config {
                key: key.to_owned(),
                value: raw,
            }),
        }
    }

    fn nonzero_or(&self, key: &str, default: usize) -> Result<usize, ParlorError> {
        match self.parse_or(key, default)? {
            0 => Err(ParlorError::Config {
                key: key.to_owned(),
                value: "0".to_owned(),
            }),
            n => Ok(n),
        }
    }

    fn secs_or(&self, key: &str, default: Duration) -> Result<Duration, ParlorError> {
        self.nonzero_or(key, default.as_secs() as usize)
            .map(|secs| Duration::from_secs(secs as u64))
    }
}
