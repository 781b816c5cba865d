//! CLI entry point for wallfetch.

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};
use wallfetch_core::{
    ApiClient, By, Cache, FetchOptions, Fetcher, Filter, IdSource, LatestSource, RateLimiter,
    RetryPolicy, RunSummary, WallpaperSource, config,
};

mod cli;

use cli::{Args, Command, DownloadArgs, FilterArgs, IdsArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(&args)?;
    debug!(?args, "CLI arguments parsed");

    let cache_path = config::resolve_cache_path(args.cache_file.clone());
    let cache = Cache::load(&cache_path)
        .with_context(|| format!("failed to load cache {}", cache_path.display()))?;

    match &args.command {
        Command::Filter(filter_args) => {
            print_filtered(&cache, filter_args);
            Ok(())
        }
        Command::Ids(ids_args) => {
            let ids = collect_ids(ids_args)?;
            if ids.is_empty() {
                bail!("no wallpaper ids given; pass ids or --input FILE");
            }
            let source = IdSource::new(ids);
            run_fetch(&args, cache, &source, true, &ids_args.download).await
        }
        Command::Latest(latest) => {
            let source =
                LatestSource::new(latest.pages.0.clone(), latest.purities, latest.categories);
            run_fetch(&args, cache, &source, latest.fetch_details, &latest.download).await
        }
    }
}

/// Installs the console layer and, when requested, a plain-text file layer.
///
/// Priority for the level: `RUST_LOG` > quiet flag > verbose flag > default (info).
fn init_tracing(args: &Args) -> Result<()> {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };
    let console_layer = (args.log_file.is_none() || args.keep_output)
        .then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn collect_ids(args: &IdsArgs) -> Result<Vec<String>> {
    let mut ids = args.ids.clone();
    if let Some(path) = &args.input {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read id file {}", path.display()))?;
        ids.extend(text.lines().map(str::to_string));
    }
    Ok(ids)
}

async fn run_fetch(
    args: &Args,
    cache: Cache,
    source: &dyn WallpaperSource,
    fetch_details: bool,
    download: &DownloadArgs,
) -> Result<()> {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs_f64(args.interval)));
    if limiter.is_disabled() {
        debug!("request pacing disabled");
    }
    let retry = RetryPolicy::with_max_attempts(args.max_retries);
    let api = ApiClient::new(limiter, retry)?
        .with_api_key(config::resolve_api_key(args.api_key.clone()));

    let options = FetchOptions {
        fetch_details,
        download_files: download.download_files,
        base_dir: config::resolve_base_dir(download.dir.clone()),
        show_progress: !args.no_progress && !args.quiet && io::stderr().is_terminal(),
        ..FetchOptions::default()
    };
    debug!(
        base_dir = %options.base_dir.display(),
        authenticated = api.has_api_key(),
        "fetch configured"
    );

    let mut fetcher = Fetcher::new(api, cache, options)?;
    let summary = fetcher.run(source).await?;
    log_summary(&summary);
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    info!(
        collected = summary.collected,
        cached = summary.enrich.cached,
        fetched = summary.enrich.fetched,
        detail_failures = summary.enrich.failed,
        "Run complete"
    );
    if let Some(report) = &summary.downloads {
        info!(
            succeeded = report.succeeded(),
            existed = report.existed(),
            failed = report.failed(),
            "Downloads complete"
        );
    }
}

fn print_filtered(cache: &Cache, args: &FilterArgs) {
    let mut selection = Filter::from_cache(cache);
    if args.ratio_min.is_some() || args.ratio_max.is_some() {
        selection = selection.by(By::ratio(
            args.ratio_min.unwrap_or(0.0),
            args.ratio_max.unwrap_or(f64::INFINITY),
        ));
    }
    if let Some(purity) = args.purity {
        selection = selection.by(By::Purity(purity));
    }
    if let Some(category) = args.category {
        selection = selection.by(By::Category(category));
    }
    if args.after.is_some() || args.before.is_some() {
        selection = selection.by(By::created_date(args.after, args.before));
    }

    for wallpaper in selection.iter() {
        println!("{}\t{}", wallpaper.id(), wallpaper.path().unwrap_or("-"));
    }
    info!(matched = selection.len(), cached = cache.len(), "Filter complete");
}
