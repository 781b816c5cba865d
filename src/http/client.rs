//! Shared `reqwest` client construction policy.

use std::time::Duration;

use reqwest::Client;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::user_agent;

/// Builds the HTTP client used for API and file requests.
///
/// Configuration:
/// - Connect timeout: 30 seconds
/// - Read timeout: 5 minutes (for large files)
/// - Gzip decompression: enabled
/// - Project User-Agent
///
/// Proxies come from the standard environment variables (`HTTPS_PROXY`,
/// `HTTP_PROXY`, `NO_PROXY`).
///
/// # Errors
///
/// Returns the underlying `reqwest` error if the client cannot be built
/// (for example, a TLS backend failure).
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .build()
}
