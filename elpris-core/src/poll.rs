//! Fetch scheduling for the main loop.

use std::time::Duration;

/// Timing state owned by the controller.
///
/// `last_update` is a monotonic instant (time since boot) of the most recent
/// fetch attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    last_update: Option<Duration>,
    update_interval: Duration,
    poll_interval: Duration,
}

impl PollState {
    pub fn new(update_interval: Duration, poll_interval: Duration) -> Self {
        Self {
            last_update: None,
            update_interval,
            poll_interval,
        }
    }

    /// A fetch is due if none was ever attempted or the update interval has elapsed
    pub fn is_due(&self, now: Duration) -> bool {
        match self.last_update {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.update_interval,
        }
    }

    /// Record an attempt at `now`. Failures count too, so a dead backend is
    /// asked at most once per update interval.
    pub fn mark_attempt(&mut self, now: Duration) {
        debug_assert!(self.last_update.map_or(true, |last| last <= now));
        self.last_update = Some(now);
    }

    pub fn last_update(&self) -> Option<Duration> {
        self.last_update
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
