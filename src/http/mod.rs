//! Shared HTTP plumbing for the catalog API client and the file downloader.
//!
//! Both consumers talk to the same remote host family, so they share one
//! request pacing policy ([`RateLimiter`]), one retry policy ([`RetryPolicy`])
//! and one `reqwest` client construction policy ([`build_http_client`]).

mod client;
pub mod constants;
pub mod rate_limiter;
mod retry;

pub use client::build_http_client;
pub use rate_limiter::RateLimiter;
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy};
