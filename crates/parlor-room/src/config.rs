//! Room configuration.

use std::time::Duration;

use parlor_game::GameTimings;
use parlor_tick::DEFAULT_TICK_INTERVAL;

/// Settings shared by every room the hub creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// How often the background loop calls [`Room::tick`](crate::Room::tick).
    pub tick_interval: Duration,

    /// Reconnection grace and post-game cleanup delays.
    pub timings: GameTimings,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            timings: GameTimings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.timings.reconnect_grace, Duration::from_secs(30));
        assert_eq!(config.timings.cleanup_delay, Duration::from_secs(10));
    }
}
