//! Bounded retry policy for throttled requests.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types shared by
//! the catalog API client and the file downloader.
//!
//! # Overview
//!
//! Every request error is classified into a [`FailureType`]:
//! - [`FailureType::Throttled`] - the server answered HTTP 429; back off and retry
//! - [`FailureType::Fatal`] - anything else; retrying would not help
//!
//! The [`RetryPolicy`] then decides whether another attempt is allowed. Throttled
//! attempts are retried after a fixed backoff until the attempt budget is spent.
//!
//! # Example
//!
//! ```
//! use wallfetch_core::http::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//!
//! match policy.should_retry(FailureType::Throttled, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::debug;

use super::constants::THROTTLE_BACKOFF;

/// Default maximum attempts per request (including the first one).
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Classification of request failures for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Server rate limiting (HTTP 429). Retried after a fixed backoff.
    Throttled,

    /// Any other failure: unauthorized, unexpected status, IO, decoding.
    Fatal,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the request.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Retry configuration: an attempt budget and a fixed throttle backoff.
///
/// # Default Values
///
/// - `max_attempts`: 5
/// - `throttle_backoff`: 5 seconds
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay applied after a throttled attempt.
    throttle_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            throttle_backoff: THROTTLE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy with custom settings.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, throttle_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            throttle_backoff,
        }
    }

    /// Creates a policy with a custom attempt budget and the default backoff.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff applied after a throttled attempt.
    #[must_use]
    pub fn throttle_backoff(&self) -> Duration {
        self.throttle_backoff
    }

    /// Determines whether to retry after attempt number `attempt` (1-indexed) failed.
    #[must_use]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Fatal {
            return RetryDecision::DoNotRetry {
                reason: "non-retryable failure".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = self.throttle_backoff.as_millis(),
            "throttled, will retry"
        );

        RetryDecision::Retry {
            delay: self.throttle_backoff,
            attempt: attempt + 1,
        }
    }
}
