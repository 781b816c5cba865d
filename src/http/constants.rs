//! Constants for HTTP access (timeouts, pacing, retry backoff).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large image files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default minimum interval between two requests (2 seconds).
///
/// The catalog API allows 45 calls per minute; 2 seconds keeps well below it.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(2);

/// Fixed backoff applied after an HTTP 429 before the next attempt.
pub const THROTTLE_BACKOFF: Duration = Duration::from_secs(5);

/// Chunk size used when writing streamed bodies to disk (32 KiB).
pub const DOWNLOAD_CHUNK_SIZE: usize = 32 * 1024;
