//! Error types for the catalog API client.

use thiserror::Error;

use super::query::QueryError;
use crate::http::FailureType;

/// Errors that can occur while talking to the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 429: the client must back off.
    #[error("too many requests (HTTP 429) for {url}")]
    TooManyRequests {
        /// The request URL (API key redacted).
        url: String,
    },

    /// HTTP 401: missing or invalid API key, or NSFW content requested as guest.
    #[error("unauthorized (HTTP 401) for {url}")]
    Unauthorized {
        /// The request URL (API key redacted).
        url: String,
    },

    /// Any other non-200 status.
    #[error("unknown response with status code {status} for {url}")]
    UnknownResponse {
        /// The request URL (API key redacted).
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request was throttled on every attempt.
    #[error("max retries exceeded after {attempts} throttled attempts for {url}")]
    MaxRetriesExceeded {
        /// The request URL (API key redacted).
        url: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The request URL (API key redacted).
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The request URL (API key redacted).
        url: String,
    },

    /// HTTP 200 whose body reports an error.
    #[error("catalog API reported an error: {message}")]
    Remote {
        /// The error text from the response body.
        message: String,
    },

    /// The body was not the expected JSON shape.
    #[error("unexpected response body from {url}: {reason}")]
    Decode {
        /// The request URL (API key redacted).
        url: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// Search filters were rejected before any request was sent.
    #[error("invalid search query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("invalid endpoint '{endpoint}' for base URL {base}")]
    InvalidEndpoint {
        /// The base URL.
        base: String,
        /// The endpoint path.
        endpoint: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ApiError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Maps a non-200 status code onto the error taxonomy.
    pub fn from_status(url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        match status {
            429 => Self::TooManyRequests { url },
            401 => Self::Unauthorized { url },
            _ => Self::UnknownResponse { url, status },
        }
    }

    /// Creates a body decoding error.
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Classifies the error for retry decisions.
    #[must_use]
    pub fn failure_type(&self) -> FailureType {
        match self {
            Self::TooManyRequests { .. } => FailureType::Throttled,
            _ => FailureType::Fatal,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TooManyRequests { .. } => Some(429),
            Self::Unauthorized { .. } => Some(401),
            Self::UnknownResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_taxonomy() {
        assert!(matches!(
            ApiError::from_status("u", 429),
            ApiError::TooManyRequests { .. }
        ));
        assert!(matches!(
            ApiError::from_status("u", 401),
            ApiError::Unauthorized { .. }
        ));
        assert!(matches!(
            ApiError::from_status("u", 503),
            ApiError::UnknownResponse { status: 503, .. }
        ));
    }

    #[test]
    fn test_only_throttling_is_retryable() {
        assert_eq!(
            ApiError::from_status("u", 429).failure_type(),
            FailureType::Throttled
        );
        assert_eq!(
            ApiError::from_status("u", 401).failure_type(),
            FailureType::Fatal
        );
        assert_eq!(
            ApiError::from_status("u", 500).failure_type(),
            FailureType::Fatal
        );
    }

    #[test]
    fn test_unknown_response_display_carries_status() {
        let msg = ApiError::from_status("https://wallhaven.cc/api/v1/w/x", 404).to_string();
        assert!(msg.contains("404"), "Expected status in: {msg}");
        assert!(msg.contains("/w/x"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ApiError::from_status("u", 418).status(), Some(418));
        assert_eq!(ApiError::decode("u", "bad").status(), None);
    }
}
