// crates/tracker/src/config.rs
//! Polling schedule and thresholds.

use std::time::Duration;

/// Timing knobs for the tracker.
///
/// The defaults encode the production schedule: the first status fetch is
/// immediate, fetches 2–10 run on a 1 s cadence while jobs often finish
/// quickly, and from the 11th fetch on the cadence widens to 2.5 s to
/// bound request volume for long runs. Transient fetch failures retry on
/// a fixed 3 s delay without counting as progress toward anything.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Spacing between early poll attempts (the 2nd through the
    /// `fast_poll_attempts`-th fetch).
    pub fast_poll_interval: Duration,
    /// Number of attempts polled at the fast interval, counting the
    /// immediate first attempt.
    pub fast_poll_attempts: u32,
    /// Spacing from the `fast_poll_attempts + 1`-th fetch onward.
    pub slow_poll_interval: Duration,
    /// Delay before retrying after a transient fetch failure.
    pub transient_retry: Duration,
    /// Elapsed time at which a still-running job is advisory-flagged as
    /// stalled. Never affects the polling schedule.
    pub stalled_after: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            fast_poll_interval: Duration::from_millis(1000),
            fast_poll_attempts: 10,
            slow_poll_interval: Duration::from_millis(2500),
            transient_retry: Duration::from_millis(3000),
            stalled_after: Duration::from_secs(90),
        }
    }
}

impl TrackerConfig {
    /// Delay between a successfully resolved attempt and the next one.
    ///
    /// `completed_attempts` is how many fetches have resolved so far; the
    /// upcoming attempt is `completed_attempts + 1`.
    pub fn poll_delay(&self, completed_attempts: u32) -> Duration {
        if completed_attempts < self.fast_poll_attempts {
            self.fast_poll_interval
        } else {
            self.slow_poll_interval
        }
    }
}
