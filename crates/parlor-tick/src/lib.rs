//! Fixed-interval tick scheduler for Parlor rooms.
//!
//! Every room runs one background task that wakes on a fixed interval
//! (one second by default) to check reconnection windows and cleanup
//! delays. [`TickScheduler`] drives that wakeup: late ticks are skipped
//! rather than replayed, slow ticks are logged, and the first tick gets a
//! small random offset so rooms created together do not wake in lockstep.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = cancel.cancelled() => break,
//!         _ = scheduler.wait_for_tick() => {
//!             room.tick(Instant::now()).await;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Default room tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest interval the scheduler accepts.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Upper bound of the random delay added to the first tick.
const INITIAL_JITTER: Duration = Duration::from_millis(50);

/// Share of the interval a tick's work may take before a warning.
const BUDGET_WARN_THRESHOLD: f64 = 0.80;

/// Fixed-interval scheduler for one room's background loop.
#[derive(Debug)]
pub struct TickScheduler {
    interval: Duration,
    tick_count: u64,
    next_tick: Instant,
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
}

impl TickScheduler {
    /// Creates a scheduler; the first tick is one interval plus jitter away.
    pub fn new(interval: Duration) -> Self {
        let interval = if interval < MIN_TICK_INTERVAL {
            warn!(?interval, "tick interval below minimum, clamping");
            MIN_TICK_INTERVAL
        } else {
            interval
        };
        let offset = Duration::from_micros(rand::rng().random_range(0..INITIAL_JITTER.as_micros() as u64));
        debug!(?interval, "tick scheduler created");

        Self {
            interval,
            tick_count: 0,
            next_tick: Instant::now() + interval + offset,
            tick_start: None,
        }
    }

    /// Sleeps until the next tick is due and returns its number, starting
    /// at 1.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched. A tick that fires whole intervals late skips
    /// the missed ones and schedules the next from now.
    pub async fn wait_for_tick(&mut self) -> u64 {
        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.tick_start = Some(now);

        let skipped = now.saturating_duration_since(due).as_nanos() / self.interval.as_nanos();
        if skipped > 0 {
            warn!(tick = self.tick_count, skipped, "tick overrun, skipping ahead");
        }
        self.next_tick = now + self.interval;

        trace!(tick = self.tick_count, "tick fired");
        self.tick_count
    }

    /// Marks the end of the current tick's work, warning when it used
    /// most of the interval.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        if elapsed.as_secs_f64() >= self.interval.as_secs_f64() * BUDGET_WARN_THRESHOLD {
            warn!(tick = self.tick_count, ?elapsed, interval = ?self.interval, "tick approaching interval budget");
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
