//! Request pacing for the catalog host.
//!
//! This module provides the [`RateLimiter`] struct which enforces a minimum
//! interval between consecutive requests, keeping the client under the
//! catalog's per-minute request allowance.
//!
//! # Overview
//!
//! All traffic goes to a single host family and runs sequentially, so a single
//! "last request" timestamp is tracked. The first request proceeds
//! immediately; every later request waits until the interval has elapsed since
//! the previous one.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use wallfetch_core::http::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_secs(2));
//!
//! // First request proceeds immediately
//! limiter.acquire().await;
//!
//! // Second request waits until two seconds have passed
//! limiter.acquire().await;
//! # }
//! ```

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Minimum-interval rate limiter shared by the API client and the downloader.
///
/// Wrap it in `Arc` to share one pacing clock between consumers.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between two requests.
    interval: Duration,

    /// Whether pacing is disabled (for `--interval 0`).
    disabled: bool,

    /// Time of the last request. `None` until the first request is made.
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = interval.as_millis()))]
    pub fn new(interval: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            interval,
            disabled: interval.is_zero(),
            last_request: Mutex::new(None),
        }
    }

    /// Creates a disabled rate limiter that applies no delays.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            interval: Duration::ZERO,
            disabled: true,
            last_request: Mutex::new(None),
        }
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the interval since the last request has elapsed, then
    /// stamps the current time as the new last request.
    pub async fn acquire(&self) {
        if self.disabled {
            return;
        }

        let mut last_request = self.last_request.lock().await;

        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let delay = self.interval.saturating_sub(elapsed);
                debug!(delay_ms = delay.as_millis(), "applying request interval");
                tokio::time::sleep(delay).await;
            }
        }

        *last_request = Some(Instant::now());
    }

    /// Restamps the last request time without waiting.
    ///
    /// Called after a streamed download finishes so the next request is paced
    /// from the end of the transfer rather than from its start.
    pub async fn mark(&self) {
        if self.disabled {
            return;
        }
        *self.last_request.lock().await = Some(Instant::now());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_new_creates_with_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        assert_eq!(limiter.interval(), Duration::from_millis(500));
        assert!(!limiter.is_disabled());
    }

    #[test]
    fn test_rate_limiter_zero_interval_is_disabled() {
        let limiter = RateLimiter::new(Duration::ZERO);
        assert!(limiter.is_disabled());
    }

    #[tokio::test]
    async fn test_rate_limiter_disabled_no_delay() {
        tokio::time::pause();

        let limiter = RateLimiter::disabled();
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_rate_limiter_first_request_no_delay() {
        tokio::time::pause();

        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();

        limiter.acquire().await;

        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_consecutive_requests() {
        tokio::time::pause();

        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        // N requests span at least (N - 1) intervals
        assert!(start.elapsed() >= Duration::from_secs(8));
        assert!(start.elapsed() < Duration::from_millis(8100));
    }

    #[tokio::test]
    async fn test_rate_limiter_no_delay_when_interval_already_elapsed() {
        tokio::time::pause();

        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.acquire().await;

        tokio::time::advance(Duration::from_secs(3)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_rate_limiter_mark_restarts_interval() {
        tokio::time::pause();

        let limiter = RateLimiter::new(Duration::from_secs(2));
        limiter.acquire().await;

        tokio::time::advance(Duration::from_millis(1500)).await;
        limiter.mark().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
