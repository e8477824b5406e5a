//! Per-connection idle timer.

use std::time::{Duration, Instant};

use courier_config::IdlePolicy;

/// Deadline after which a silent connection is closed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdleDeadline {
    timeout: Duration,
    policy: IdlePolicy,
    expires_at: Instant,
}

impl IdleDeadline {
    /// Starts the timer at `now`.
    pub(crate) fn start(timeout: Duration, policy: IdlePolicy, now: Instant) -> Self {
        Self {
            timeout,
            policy,
            expires_at: now + timeout,
        }
    }

    /// Time left before expiry, or `None` once the deadline has passed.
    pub(crate) fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .checked_duration_since(now)
            .filter(|left| !left.is_zero())
    }

    /// Records inbound traffic; only [`IdlePolicy::ResetOnActivity`] restarts
    /// the timer.
    pub(crate) fn record_activity(&mut self, now: Instant) {
        if self.policy == IdlePolicy::ResetOnActivity {
            self.expires_at = now + self.timeout;
        }
    }
}
