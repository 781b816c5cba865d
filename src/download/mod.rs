//! Wallpaper file downloads.
//!
//! # Features
//!
//! - Deterministic sharded save paths (`<base>/<shard>/<file name>`)
//! - Idempotent: files already on disk are never requested again
//! - Streaming downloads through a fixed-size write buffer
//! - Content-length verification with partial-file cleanup
//! - Shared request pacing and throttling retries with the catalog client
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallfetch_core::download::WallpaperDownloader;
//! use wallfetch_core::http::{RateLimiter, RetryPolicy};
//! use wallfetch_core::http::constants::DEFAULT_REQUEST_INTERVAL;
//! use wallfetch_core::wallpaper::Wallpaper;
//!
//! # async fn example(wallpaper: Wallpaper) -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(DEFAULT_REQUEST_INTERVAL));
//! let downloader = WallpaperDownloader::new("./walls", limiter, RetryPolicy::default())?;
//! let outcome = downloader.download(&wallpaper).await;
//! println!("{}: {}", outcome.id, outcome.status);
//! # Ok(())
//! # }
//! ```

mod downloader;
mod error;
mod path;
mod report;

pub use downloader::WallpaperDownloader;
pub use error::DownloadError;
pub use path::{FILENAME_PREFIX, save_path};
pub use report::{DownloadOutcome, DownloadReport, DownloadStatus};
