//! Wallfetch Core Library
//!
//! Fetches wallpaper metadata from the wallhaven catalog API, caches it on
//! disk keyed by wallpaper id, and downloads the image files into a sharded
//! directory tree.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`http`] - Shared client construction, request pacing and retry policy
//! - [`api`] - Catalog API client (detail and search endpoints)
//! - [`cache`] - Persistent id to payload cache
//! - [`wallpaper`] - Entity model with typed accessors and classification masks
//! - [`download`] - Streaming, idempotent file downloads
//! - [`fetcher`] - Run orchestration: collect, enrich, download, report
//! - [`filter`] - Chainable selection over cached wallpapers
//! - [`config`] - Environment-sourced defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cache;
pub mod config;
pub mod download;
pub mod fetcher;
pub mod filter;
pub mod http;
pub(crate) mod user_agent;
pub mod wallpaper;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, QueryError, SearchQuery};
pub use cache::{Cache, CacheError};
pub use download::{
    DownloadError, DownloadOutcome, DownloadReport, DownloadStatus, WallpaperDownloader,
};
pub use fetcher::{
    EnrichStats, FetchError, FetchOptions, Fetcher, IdSource, LatestSource, RunSummary,
    WallpaperSource,
};
pub use filter::{By, Filter};
pub use http::{RateLimiter, RetryPolicy};
pub use wallpaper::{Category, Purity, Wallpaper};
