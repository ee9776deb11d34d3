//! Reconnection Policy
//!
//! Fixed-delay, unlimited-attempt reconnection for the streaming channel.
//! Every observed disconnect schedules exactly one retry after the
//! configured delay; there is no backoff ceiling and no attempt cap, so
//! the worst case is degraded liveness until the next successful connect.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    /// Delay between a disconnect and the next connection attempt.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
        }
    }
}

/// Reconnection policy tracking attempts across connection failures.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnection policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempt_count: 0,
        }
    }

    /// Record an attempt and return the delay before it.
    ///
    /// Always returns a delay; retry never stops.
    pub const fn next_delay(&mut self) -> Duration {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.config.delay
    }

    /// Reset the attempt counter after a successful authentication.
    pub const fn reset(&mut self) {
        self.attempt_count = 0;
    }

    /// Number of attempts since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}
