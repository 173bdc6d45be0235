//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use ratefetch_core::download::constants::{DEFAULT_MAX_ATTEMPTS, MAX_ATTEMPTS_CEILING};

/// Download a list of URLs from rate-limited servers, politely.
///
/// URLs are read from positional arguments, `--url-file`, or standard
/// input (one per line; blank lines and `#` comments are ignored) and
/// fetched strictly one at a time, honoring server rate-limit headers and
/// retrying transient failures with exponential backoff.
#[derive(Parser, Debug)]
#[command(name = "ratefetch")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download (defaults to --url-file or stdin)
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Path to a file containing URLs, one per line
    #[arg(long, value_name = "FILE")]
    pub url_file: Option<PathBuf>,

    /// Directory to save downloads
    #[arg(short = 'd', long, default_value = "download")]
    pub download_dir: PathBuf,

    /// Path prefix to strip when mapping URLs to local paths (repeatable)
    #[arg(short = 'p', long = "strip-prefix", value_name = "PREFIX")]
    pub strip_prefixes: Vec<String>,

    /// Also strip the longest path prefix common to all URLs
    #[arg(long)]
    pub auto_strip_prefix: bool,

    /// Only download URLs matching this regular expression
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Invert --filter: download URLs that do NOT match
    #[arg(long, requires = "filter")]
    pub invert_match: bool,

    /// Randomize the order of the URLs
    #[arg(long)]
    pub randomize: bool,

    /// Maximum attempts per URL, including the first (1-20)
    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..=MAX_ATTEMPTS_CEILING as i64)
    )]
    pub max_tries: u32,

    /// Base backoff unit in milliseconds (also bounds the jitter)
    #[arg(
        long,
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    pub base_delay_ms: u64,

    /// Simulate the run without any network calls or file writes
    #[arg(long)]
    pub dry_run: bool,

    /// Also write log output to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
