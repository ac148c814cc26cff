//! Retry policy: attempt cap + exponential backoff schedule.

use std::time::Duration;

/// Backoff schedule consumed by the dispatcher.
///
/// Attempt `n` (1-based) that fails transiently waits
/// `min(base_delay * 2^(n-1), max_delay)` before attempt `n + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Minimum 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after a failed `attempt` (1-based) before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        let factor = 1u64 << shift;
        self.base_delay
            .checked_mul(factor as u32)
            .map(|d| d.min(self.max_delay))
            .unwrap_or(self.max_delay)
    }

    /// True when `attempt` (1-based) was the last permitted one.
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts.max(1)
    }
}
