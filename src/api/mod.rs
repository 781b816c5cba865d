//! Rate-limited client for the wallhaven catalog API.
//!
//! Every request waits on the shared [`RateLimiter`] before it is sent. The
//! response status is classified into the [`ApiError`] taxonomy: 200 is
//! success, 429 is throttling (retried after a fixed backoff up to the
//! [`RetryPolicy`] budget), 401 is unauthorized, and anything else is an
//! unknown response. Only throttling is retried.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallfetch_core::api::ApiClient;
//! use wallfetch_core::http::{RateLimiter, RetryPolicy};
//! use wallfetch_core::http::constants::DEFAULT_REQUEST_INTERVAL;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(DEFAULT_REQUEST_INTERVAL));
//! let api = ApiClient::new(limiter, RetryPolicy::default())?;
//! let payload = api.wallpaper_detail("94x38z").await?;
//! println!("{:?}", payload.get("path"));
//! # Ok(())
//! # }
//! ```

mod error;
mod query;

use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

pub use error::ApiError;
pub use query::{COLOR_PALETTE, Color, QueryError, SearchQuery, Sorting, SortingOrder, TopRange};

use crate::http::{FailureType, RateLimiter, RetryDecision, RetryPolicy, build_http_client};
use crate::wallpaper::{Payload, Wallpaper};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://wallhaven.cc/api/v1/";

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Wallpapers on this page (sparse search-row payloads).
    pub wallpapers: Vec<Wallpaper>,
    /// `meta.current_page`, when reported.
    pub current_page: Option<u64>,
    /// `meta.last_page`, when reported.
    pub last_page: Option<u64>,
    /// `meta.seed` for random sorting, when reported.
    pub seed: Option<String>,
}

/// Client for the detail and search endpoints.
///
/// Cheap to clone; clones share the HTTP connection pool and the rate limiter.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client for the production API without an API key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Result<Self, ApiError> {
        let client = build_http_client().map_err(ApiError::ClientBuild)?;
        Self::with_client(client, DEFAULT_BASE_URL, limiter, retry)
    }

    /// Creates a client with an existing `reqwest` client and base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if `base_url` is not an absolute
    /// hierarchical URL.
    pub fn with_client(
        client: Client,
        base_url: &str,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidEndpoint {
                base: base_url.to_string(),
                endpoint: String::new(),
            })?;
        Ok(Self {
            client,
            base_url,
            api_key: None,
            limiter,
            retry,
        })
    }

    /// Sets the API key sent as the `apikey` query parameter.
    ///
    /// Blank keys are treated as no key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the retry policy applied to throttled requests.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the rate limiter shared with other clients.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetches the full metadata payload for one wallpaper (`GET /w/{id}`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for non-200 statuses, exhausted throttling retries,
    /// network failures, and bodies without a `data` object.
    #[instrument(skip(self))]
    pub async fn wallpaper_detail(&self, id: &str) -> Result<Payload, ApiError> {
        let url = self.endpoint(&["w", id], &[])?;
        let body = self.get_json(&url).await?;
        match take_data(body) {
            Some(Value::Object(payload)) => Ok(payload),
            _ => Err(ApiError::decode(url.as_str(), "missing 'data' object")),
        }
    }

    /// Runs a search and returns the wallpapers on the requested page.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidQuery`] without sending anything when the
    /// filters are malformed; otherwise the same errors as
    /// [`wallpaper_detail`](Self::wallpaper_detail).
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Wallpaper>, ApiError> {
        Ok(self.search_page(query).await?.wallpapers)
    }

    /// Runs a search and returns the page with its pagination metadata.
    ///
    /// Rows without an `id` are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search).
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn search_page(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        let params = query.to_query_pairs()?;
        let url = self.endpoint(&["search"], &params)?;
        let body = self.get_json(&url).await?;

        let meta = body.get("meta").cloned().unwrap_or(Value::Null);
        let rows = match take_data(body) {
            Some(Value::Array(rows)) => rows,
            _ => return Err(ApiError::decode(url.as_str(), "missing 'data' array")),
        };

        let wallpapers = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(payload) => match Wallpaper::from_payload(payload) {
                    Ok(wallpaper) => Some(wallpaper),
                    Err(error) => {
                        warn!(%error, "skipping search row");
                        None
                    }
                },
                other => {
                    warn!(row = %other, "skipping non-object search row");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(count = wallpapers.len(), "search page parsed");
        Ok(SearchPage {
            wallpapers,
            current_page: meta.get("current_page").and_then(Value::as_u64),
            last_page: meta.get("last_page").and_then(Value::as_u64),
            seed: meta
                .get("seed")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Builds an endpoint URL (without the API key).
    fn endpoint(&self, segments: &[&str], params: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidEndpoint {
                base: self.base_url.to_string(),
                endpoint: segments.join("/"),
            })?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    /// Sends a GET with pacing and throttling retries, returning the JSON body.
    async fn get_json(&self, url: &Url) -> Result<Value, ApiError> {
        let mut request_url = url.clone();
        if let Some(key) = &self.api_key {
            request_url.query_pairs_mut().append_pair("apikey", key);
        }

        let mut attempt = 1;
        loop {
            let error = match self.send_once(&request_url, url.as_str()).await {
                Ok(body) => return Ok(body),
                Err(error) => error,
            };

            match self.retry.should_retry(error.failure_type(), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    debug!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "throttled by catalog API, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    if error.failure_type() == FailureType::Throttled {
                        warn!(url = %url, attempt, %reason, "giving up after repeated throttling");
                        return Err(ApiError::MaxRetriesExceeded {
                            url: url.to_string(),
                            attempts: attempt,
                        });
                    }
                    return Err(error);
                }
            }
        }
    }

    /// One paced request, classified by status.
    async fn send_once(&self, request_url: &Url, display_url: &str) -> Result<Value, ApiError> {
        self.limiter.acquire().await;

        let response = self
            .client
            .get(request_url.clone())
            .send()
            .await
            .map_err(|e| ApiError::network(display_url, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(ApiError::from_status(display_url, status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::decode(display_url, e.to_string()))?;

        if let Some(error) = body.get("error") {
            let message = error
                .as_str()
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(ApiError::Remote { message });
        }

        Ok(body)
    }
}

fn take_data(body: Value) -> Option<Value> {
    match body {
        Value::Object(mut map) => map.remove("data"),
        _ => None,
    }
}
