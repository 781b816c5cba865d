//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};

use wallfetch_core::http::DEFAULT_MAX_RETRIES;
use wallfetch_core::wallpaper::{Category, Purity};

/// Longest accepted request interval in seconds.
const MAX_INTERVAL_SECS: f64 = 3600.0;

/// Fetch, cache and download wallpapers from the wallhaven catalog.
#[derive(Parser, Debug)]
#[command(name = "wallfetch")]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write logs to this file (console output is then suppressed)
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Keep console logging when --log-file is given
    #[arg(long, global = true)]
    pub keep_output: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Metadata cache file [env: WALLFETCH_CACHE_FILE]
    #[arg(long, value_name = "FILE", global = true)]
    pub cache_file: Option<PathBuf>,

    /// API key sent with every catalog request [env: WALLHAVEN_API_KEY]
    #[arg(long, value_name = "KEY", global = true)]
    pub api_key: Option<String>,

    /// Minimum delay between requests in seconds (0 to disable)
    #[arg(short = 'i', long, default_value_t = 2.0, value_parser = parse_interval, global = true)]
    pub interval: f64,

    /// Maximum attempts per request when throttled (1-20)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=20), global = true)]
    pub max_retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch details for specific wallpaper ids
    #[command(name = "ids")]
    Ids(IdsArgs),

    /// Fetch the latest uploads, page by page
    #[command(name = "latest")]
    Latest(LatestArgs),

    /// Print cached wallpapers matching all given predicates
    #[command(name = "filter")]
    Filter(FilterArgs),
}

/// Download switches shared by the fetching subcommands.
#[derive(ClapArgs, Debug, Clone)]
pub struct DownloadArgs {
    /// Download the wallpaper files
    #[arg(short = 'd', long)]
    pub download_files: bool,

    /// Base directory for downloaded files [env: WALLHAVEN_DIR]
    #[arg(short = 'D', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct IdsArgs {
    /// Wallpaper ids
    #[arg(value_name = "ID")]
    pub ids: Vec<String>,

    /// Read additional ids from a file, one per line
    #[arg(short = 'I', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub download: DownloadArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LatestArgs {
    /// Pages to fetch: numbers and inclusive ranges, comma separated (1-5,8)
    #[arg(short = 'p', long = "page", default_value = "1-50", value_parser = parse_page_spec)]
    pub pages: PageSpec,

    /// Category mask (general, anime, people) as a binary string
    #[arg(short = 'C', long, default_value = "111")]
    pub categories: Category,

    /// Purity mask (sfw, sketchy, nsfw) as a binary string
    #[arg(short = 'P', long, default_value = "110")]
    pub purities: Purity,

    /// Fetch full details for every collected wallpaper
    #[arg(short = 'f', long)]
    pub fetch_details: bool,

    #[command(flatten)]
    pub download: DownloadArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct FilterArgs {
    /// Minimum aspect ratio (inclusive)
    #[arg(long)]
    pub ratio_min: Option<f64>,

    /// Maximum aspect ratio (inclusive)
    #[arg(long)]
    pub ratio_max: Option<f64>,

    /// Purity mask to intersect
    #[arg(long)]
    pub purity: Option<Purity>,

    /// Category mask to intersect
    #[arg(long)]
    pub category: Option<Category>,

    /// Earliest upload date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub after: Option<NaiveDate>,

    /// Latest upload date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub before: Option<NaiveDate>,
}

/// Ordered, duplicate-free list of page numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec(pub Vec<u32>);

/// Parses `1-5,8,10-12` into page numbers; ranges are inclusive.
pub fn parse_page_spec(raw: &str) -> Result<PageSpec, String> {
    let mut pages = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_page(start)?;
                let end = parse_page(end)?;
                if start > end {
                    return Err(format!("page range '{part}' is descending"));
                }
                pages.extend(start..=end);
            }
            None => pages.push(parse_page(part)?),
        }
    }

    let mut seen = std::collections::HashSet::new();
    pages.retain(|page| seen.insert(*page));
    if pages.is_empty() {
        return Err("no pages given".to_string());
    }
    Ok(PageSpec(pages))
}

fn parse_page(raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .ok_or_else(|| format!("invalid page number '{}'", raw.trim()))
}

fn parse_interval(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid interval '{raw}'"))?;
    if !secs.is_finite() || !(0.0..=MAX_INTERVAL_SECS).contains(&secs) {
        return Err(format!("interval must be between 0 and {MAX_INTERVAL_SECS} seconds"));
    }
    Ok(secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_ids_defaults() {
        let args = parse(&["wallfetch", "ids", "abc123", "def456"]);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!((args.interval - 2.0).abs() < f64::EPSILON);
        assert_eq!(args.max_retries, 5);
        let Command::Ids(ids) = args.command else {
            panic!("expected ids subcommand");
        };
        assert_eq!(ids.ids, vec!["abc123", "def456"]);
        assert!(!ids.download.download_files);
        assert!(ids.download.dir.is_none());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = parse(&["wallfetch", "-vv", "ids", "a"]);
        assert_eq!(args.verbose, 2);
        let args = parse(&["wallfetch", "ids", "a", "--verbose"]);
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let args = parse(&[
            "wallfetch", "latest", "-q", "-i", "0", "-r", "3", "--no-progress",
        ]);
        assert!(args.quiet);
        assert!(args.interval.abs() < f64::EPSILON);
        assert_eq!(args.max_retries, 3);
        assert!(args.no_progress);
    }

    #[test]
    fn test_cli_latest_defaults() {
        let args = parse(&["wallfetch", "latest"]);
        let Command::Latest(latest) = args.command else {
            panic!("expected latest subcommand");
        };
        assert_eq!(latest.pages, PageSpec((1..=50).collect()));
        assert_eq!(latest.categories, Category::ALL);
        assert_eq!(latest.purities, Purity::SFW_SKETCHY);
        assert!(!latest.fetch_details);
    }

    #[test]
    fn test_cli_latest_all_flags() {
        let args = parse(&[
            "wallfetch", "latest", "-p", "2-4", "-C", "100", "-P", "sfw", "-f", "-d", "-D",
            "/tmp/walls",
        ]);
        let Command::Latest(latest) = args.command else {
            panic!("expected latest subcommand");
        };
        assert_eq!(latest.pages, PageSpec(vec![2, 3, 4]));
        assert_eq!(latest.categories, Category::GENERAL);
        assert_eq!(latest.purities, Purity::SFW);
        assert!(latest.fetch_details);
        assert!(latest.download.download_files);
        assert_eq!(latest.download.dir, Some(PathBuf::from("/tmp/walls")));
    }

    #[test]
    fn test_cli_filter_flags() {
        let args = parse(&[
            "wallfetch",
            "filter",
            "--ratio-min",
            "1.5",
            "--purity",
            "100",
            "--after",
            "2021-01-01",
        ]);
        let Command::Filter(filter) = args.command else {
            panic!("expected filter subcommand");
        };
        assert_eq!(filter.ratio_min, Some(1.5));
        assert_eq!(filter.ratio_max, None);
        assert_eq!(filter.purity, Some(Purity::SFW));
        assert_eq!(filter.after, NaiveDate::from_ymd_opt(2021, 1, 1));
    }

    #[test]
    fn test_cli_missing_subcommand_rejected() {
        assert!(Args::try_parse_from(["wallfetch"]).is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["wallfetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["wallfetch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_max_retries_bounds() {
        for bad in ["0", "21"] {
            let err = Args::try_parse_from(["wallfetch", "-r", bad, "ids", "a"]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_negative_interval_rejected() {
        let err = Args::try_parse_from(["wallfetch", "--interval=-1", "ids", "a"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_bad_mask_rejected() {
        let err = Args::try_parse_from(["wallfetch", "latest", "-C", "12x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_page_spec_ranges_and_dedup() {
        assert_eq!(
            parse_page_spec("1-3, 2,7").unwrap(),
            PageSpec(vec![1, 2, 3, 7])
        );
        assert_eq!(parse_page_spec("5").unwrap(), PageSpec(vec![5]));
    }

    #[test]
    fn test_page_spec_rejects_bad_input() {
        assert!(parse_page_spec("").is_err());
        assert!(parse_page_spec("0").is_err());
        assert!(parse_page_spec("3-1").is_err());
        assert!(parse_page_spec("a-b").is_err());
    }
}
