//! Retry policy for lifecycle operations
//!
//! The policy is a pure function from (error, attempt) to a decision, kept
//! independent of the transport so it is unit-testable without a live
//! broker. Only transient kinds are ever re-attempted, with a fixed delay
//! between attempts.

use crate::error::Error;
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Sleep for the given delay, then try again
    Retry(Duration),
    /// Give up and surface the error
    Fail,
}

/// Bounded fixed-delay retry policy
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts, first attempt included
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Decide whether a failed attempt may be retried.
    ///
    /// `attempt` is 1-based: the first call that fails is attempt 1.
    /// Semantic failures are never retried; transient failures are retried
    /// until the attempt budget is spent.
    pub fn decide(&self, error: &Error, attempt: u32) -> Decision {
        if error.is_transient() && attempt < self.max_attempts {
            Decision::Retry(self.delay)
        } else {
            Decision::Fail
        }
    }
}
