//! Fetch pipeline: collect, enrich, download, report.
//!
//! A [`Fetcher`] owns the cache for the duration of a run and drives the
//! phases strictly in sequence. Failures of individual wallpapers never abort
//! the run: a failed detail fetch marks the wallpaper with the error sentinel
//! path and a failed download is recorded in the [`DownloadReport`]. Only
//! malformed search input and cache persistence errors end a run early.

mod progress;
mod source;

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use source::{IdSource, LatestSource, WallpaperSource};

use crate::api::{ApiClient, QueryError};
use crate::cache::{Cache, CacheError};
use crate::download::{DownloadError, DownloadReport, WallpaperDownloader};
use crate::wallpaper::Wallpaper;
use progress::phase_bar;

/// Number of new cache entries between intermediate cache flushes.
pub const DEFAULT_CACHE_FLUSH_EVERY: usize = 200;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Search input was rejected before any request was sent.
    #[error("invalid search query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// The cache could not be written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The downloader could not be constructed.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Resolved settings for a run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Fetch detail payloads for collected wallpapers.
    pub fetch_details: bool,
    /// Download the wallpaper files.
    pub download_files: bool,
    /// Base directory for downloaded files.
    pub base_dir: PathBuf,
    /// Draw progress bars on stderr.
    pub show_progress: bool,
    /// Flush the cache after this many new entries; `0` flushes only at phase end.
    pub cache_flush_every: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            fetch_details: true,
            download_files: false,
            base_dir: PathBuf::from("."),
            show_progress: false,
            cache_flush_every: DEFAULT_CACHE_FLUSH_EVERY,
        }
    }
}

/// Counters from the enrichment phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Served from the cache without a request.
    pub cached: usize,
    /// Fetched from the API and cached.
    pub fetched: usize,
    /// Detail fetch failed; marked with the error sentinel.
    pub failed: usize,
}

/// Result of [`Fetcher::run`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of wallpapers the source produced.
    pub collected: usize,
    /// Counters from the enrich phase; all zero when details were not fetched.
    pub enrich: EnrichStats,
    /// Present when files were downloaded.
    pub downloads: Option<DownloadReport>,
    /// The collected wallpapers after enrichment.
    pub wallpapers: Vec<Wallpaper>,
}

/// Drives one fetch run over a [`WallpaperSource`].
#[derive(Debug)]
pub struct Fetcher {
    api: ApiClient,
    downloader: WallpaperDownloader,
    cache: Cache,
    options: FetchOptions,
}

impl Fetcher {
    /// Creates a fetcher whose downloader shares the API client's rate limiter
    /// and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Download`] if the download client cannot be built.
    pub fn new(api: ApiClient, cache: Cache, options: FetchOptions) -> Result<Self, FetchError> {
        let downloader = WallpaperDownloader::new(
            options.base_dir.clone(),
            api.limiter().clone(),
            api.retry_policy().clone(),
        )?;
        Ok(Self {
            api,
            downloader,
            cache,
            options,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Consumes the fetcher, returning the cache.
    #[must_use]
    pub fn into_cache(self) -> Cache {
        self.cache
    }

    #[must_use]
    pub fn downloader(&self) -> &WallpaperDownloader {
        &self.downloader
    }

    /// Runs collect, then the enabled enrich and download phases.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for invalid search input or a failed cache write.
    #[instrument(skip_all, fields(source = %source.describe()))]
    pub async fn run(&mut self, source: &dyn WallpaperSource) -> Result<RunSummary, FetchError> {
        let mut wallpapers = source.collect(&self.api).await?;
        let collected = wallpapers.len();
        info!(collected, "collected wallpapers");

        let enrich = if self.options.fetch_details {
            self.enrich(&mut wallpapers).await?
        } else {
            EnrichStats::default()
        };

        let downloads = if self.options.download_files {
            Some(self.download_all(&wallpapers).await)
        } else {
            None
        };

        Ok(RunSummary {
            collected,
            enrich,
            downloads,
            wallpapers,
        })
    }

    /// Merges detail payloads into `wallpapers`, cache first.
    ///
    /// Newly fetched payloads are written to the cache, which is flushed every
    /// `cache_flush_every` additions and once at the end.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cache`] if a cache flush fails.
    pub async fn enrich(
        &mut self,
        wallpapers: &mut [Wallpaper],
    ) -> Result<EnrichStats, FetchError> {
        let bar = phase_bar(self.options.show_progress, wallpapers.len(), "details");
        let mut stats = EnrichStats::default();
        let mut pending = 0usize;

        for wallpaper in wallpapers.iter_mut() {
            if let Some(payload) = self.cache.get(wallpaper.id()) {
                debug!(id = %wallpaper.id(), "cache hit");
                wallpaper.merge(payload);
                stats.cached += 1;
            } else {
                match self.api.wallpaper_detail(wallpaper.id()).await {
                    Ok(payload) => {
                        wallpaper.merge(&payload);
                        self.cache.put_wallpaper(wallpaper);
                        stats.fetched += 1;
                        pending += 1;
                        if self.options.cache_flush_every > 0
                            && pending >= self.options.cache_flush_every
                        {
                            self.cache.persist().await?;
                            pending = 0;
                        }
                    }
                    Err(error) => {
                        warn!(id = %wallpaper.id(), %error, "detail fetch failed");
                        wallpaper.mark_error();
                        stats.failed += 1;
                    }
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        self.cache.persist().await?;
        info!(
            cached = stats.cached,
            fetched = stats.fetched,
            failed = stats.failed,
            "enrichment finished"
        );
        Ok(stats)
    }

    /// Downloads every wallpaper's file once per id and logs the summary.
    pub async fn download_all(&self, wallpapers: &[Wallpaper]) -> DownloadReport {
        let bar = phase_bar(self.options.show_progress, wallpapers.len(), "downloads");
        let mut report = DownloadReport::new();

        for wallpaper in wallpapers {
            if !report.contains(wallpaper.id()) {
                let outcome = self.downloader.download(wallpaper).await;
                report.record(outcome);
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        report.log_summary();
        report
    }
}
