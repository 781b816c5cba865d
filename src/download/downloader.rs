//! Streaming wallpaper file downloader.
//!
//! Files are written to a deterministic sharded path (see [`save_path`]).
//! An existing file short-circuits the transfer. Each attempt waits on the
//! shared [`RateLimiter`], streams the body to disk through a fixed-size
//! buffer and verifies the byte count against `Content-Length`. Throttled
//! attempts are retried per the [`RetryPolicy`]; anything else fails the
//! wallpaper. A partially written file is removed on failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::error::DownloadError;
use super::path::save_path;
use super::report::{DownloadOutcome, DownloadStatus};
use crate::http::constants::DOWNLOAD_CHUNK_SIZE;
use crate::http::{RateLimiter, RetryDecision, RetryPolicy, build_http_client};
use crate::wallpaper::Wallpaper;

/// Downloads wallpaper files under a base directory.
#[derive(Debug, Clone)]
pub struct WallpaperDownloader {
    client: Client,
    base_dir: PathBuf,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl WallpaperDownloader {
    /// Creates a downloader with the shared client construction policy.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Result<Self, DownloadError> {
        let client = build_http_client().map_err(DownloadError::ClientBuild)?;
        Ok(Self::with_client(client, base_dir, limiter, retry))
    }

    /// Creates a downloader around an existing `reqwest` client.
    #[must_use]
    pub fn with_client(
        client: Client,
        base_dir: impl Into<PathBuf>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_dir: base_dir.into(),
            limiter,
            retry,
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Local save path for `wallpaper`, or `None` if its remote path is
    /// missing, the error sentinel, or has no usable file name.
    #[must_use]
    pub fn save_path(&self, wallpaper: &Wallpaper) -> Option<PathBuf> {
        if wallpaper.is_error() {
            return None;
        }
        save_path(&self.base_dir, wallpaper.path()?)
    }

    /// Downloads the wallpaper's file, never failing the caller.
    ///
    /// The returned outcome is [`DownloadStatus::Existed`] without any request
    /// when the target file is already present.
    #[instrument(skip(self, wallpaper), fields(id = %wallpaper.id()))]
    pub async fn download(&self, wallpaper: &Wallpaper) -> DownloadOutcome {
        let remote_path = wallpaper.path().map(str::to_string);
        let mut outcome = DownloadOutcome {
            id: wallpaper.id().to_string(),
            remote_path: remote_path.clone(),
            path: None,
            status: DownloadStatus::Failed,
        };

        let (Some(remote), Some(dest)) = (remote_path, self.save_path(wallpaper)) else {
            warn!("no downloadable path");
            return outcome;
        };
        outcome.path = Some(dest.clone());

        if fs::metadata(&dest).await.is_ok_and(|m| m.is_file()) {
            debug!(path = %dest.display(), "file already exists, skipping");
            outcome.status = DownloadStatus::Existed;
            return outcome;
        }

        let mut attempt = 1;
        loop {
            let error = match self.fetch_file(&remote, &dest).await {
                Ok(bytes) => {
                    info!(path = %dest.display(), bytes, "downloaded");
                    outcome.status = DownloadStatus::Succeeded;
                    return outcome;
                }
                Err(error) => error,
            };

            match self.retry.should_retry(error.failure_type(), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        "throttled by file host, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(url = %remote, %error, %reason, "download failed");
                    return outcome;
                }
            }
        }
    }

    /// Performs one paced download attempt of `url` into `dest`.
    ///
    /// Returns the number of bytes written. On any failure after the file was
    /// created, the partial file is removed.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for non-200 statuses, network and IO failures,
    /// and byte-count mismatches.
    pub async fn fetch_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        self.limiter.acquire().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(DownloadError::from_status(url, status));
        }
        let expected = response.content_length();

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }
        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let result = stream_to_file(&mut file, response, url, dest).await;
        drop(file);
        self.limiter.mark().await;

        let verified = result.and_then(|written| verify_length(dest, expected, written));

        if verified.is_err() {
            if let Err(error) = fs::remove_file(dest).await {
                warn!(path = %dest.display(), %error, "failed to remove partial file");
            }
        }
        verified
    }
}

/// Checks the written byte count against the declared `Content-Length`.
fn verify_length(dest: &Path, expected: Option<u64>, written: u64) -> Result<u64, DownloadError> {
    match expected {
        Some(expected) if expected != written => {
            Err(DownloadError::integrity(dest, expected, written))
        }
        _ => Ok(written),
    }
}

async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
