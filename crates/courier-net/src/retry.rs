//! Pluggable connect retry policies.
//!
//! The session task consults the policy after each failed establishment
//! attempt.  The default performs no in-loop retry: reopening is driven
//! by the caller (the view layer remounting a chat), which matches the
//! original client behavior while keeping the seam explicit.

use std::time::Duration;

/// Retry policy for connection establishment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Fail on the first unsuccessful attempt.
    #[default]
    None,

    /// Retry up to `max_attempts` times with a constant delay.
    Fixed {
        delay: Duration,
        max_attempts: u32,
    },

    /// Retry up to `max_attempts` times, doubling the delay each attempt
    /// and capping it at `max_delay`.
    Exponential {
        base: Duration,
        max_delay: Duration,
        max_attempts: u32,
    },
}

impl RetryPolicy {
    /// Delay to wait before retry number `attempt` (1-based), or `None`
    /// when the policy is exhausted and the session should fail.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Fixed {
                delay,
                max_attempts,
            } => (attempt <= *max_attempts).then_some(*delay),
            RetryPolicy::Exponential {
                base,
                max_delay,
                max_attempts,
            } => {
                if attempt > *max_attempts {
                    return None;
                }
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                Some(base.saturating_mul(factor).min(*max_delay))
            }
        }
    }
}
