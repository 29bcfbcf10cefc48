//! Tunables for the reconnect loop.

use std::time::Duration;

/// Default cap on automatic reconnect attempts per outage.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default first backoff delay; doubles on every further attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default spacing between heartbeat pings on an open connection.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default settle delay before re-issuing a partner search on a fresh
/// connection that was mid-search when the previous one dropped.
pub const DEFAULT_RESUME_DELAY: Duration = Duration::from_millis(500);

/// Default capacity of the event channel handed to the embedder.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Connection-resilience knobs for [`ChatClient`](crate::ChatClient).
///
/// The defaults give the backoff schedule 1s, 2s, 4s, 8s, 16s and then give
/// up. All fields are plain data; use the `with_*` builders to tweak one
/// without spelling out the rest.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Automatic redial attempts allowed per outage before going terminal.
    pub max_attempts: u32,
    /// Delay before the first redial; doubles per subsequent attempt.
    pub base_delay: Duration,
    /// Interval between heartbeat pings while connected.
    pub heartbeat_interval: Duration,
    /// Wait before resuming an interrupted partner search after a redial.
    pub resume_delay: Duration,
    /// Event channel capacity; clamped to at least 1.
    pub event_channel_capacity: usize,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            resume_delay: DEFAULT_RESUME_DELAY,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ReconnectPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }

    pub fn with_resume_delay(mut self, resume_delay: Duration) -> Self {
        self.resume_delay = resume_delay;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Backoff before redial number `attempt + 1`, i.e. `attempt` counts
    /// failures already absorbed this outage. Saturates instead of
    /// overflowing for absurd attempt counts.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (0..5).map(|n| policy.backoff_delay(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 16_000]);
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = ReconnectPolicy::default();
        assert!(policy.backoff_delay(40) >= policy.backoff_delay(31));
        assert!(policy.backoff_delay(u32::MAX) > Duration::from_secs(3600));
    }

    #[test]
    fn event_capacity_clamps_to_one() {
        let policy = ReconnectPolicy::new().with_event_channel_capacity(0);
        assert_eq!(policy.event_channel_capacity, 1);
    }
}
