//! Retry budget
//!
//! Fixed-delay, bounded attempts. One budget lives for a whole reconnect loop
//! and is reset whenever a Hello is accepted.

use std::time::Duration;

/// What to do after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`; `attempt` is the failure count so far
    Retry { attempt: u32, delay: Duration },
    /// Give up
    Exhausted { attempts: u32 },
}

/// Bounded retry counter
#[derive(Debug, Clone)]
pub struct RetryBudget {
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
}

impl RetryBudget {
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Count a failure
    ///
    /// With `max_attempts = n` the first `n - 1` failures retry and the
    /// `n`-th is exhausted.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts < self.max_attempts {
            RetryDecision::Retry {
                attempt: self.attempts,
                delay: self.delay,
            }
        } else {
            RetryDecision::Exhausted {
                attempts: self.attempts,
            }
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}
