//! CLI entry point for the ratefetch tool.

use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ratefetch_core::{
    CancelFlag, EngineConfig, HttpTransport, InputFilter, Runner, read_urls,
};
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    init_tracing(&args)?;

    debug!(?args, "CLI arguments parsed");

    // Gather URLs: positional args, then --url-file, then stdin
    let urls = if args.urls.is_empty() {
        if args.url_file.is_none() && std::io::stdin().is_terminal() {
            info!("No input provided. Pipe URLs via stdin, pass --url-file, or pass URLs as arguments.");
            info!("Example: echo 'https://example.com/data.csv' | ratefetch");
            return Ok(());
        }
        read_urls(args.url_file.as_deref()).context("failed to read URL list")?
    } else {
        args.urls.clone()
    };

    let filter = InputFilter::new(args.filter.as_deref(), args.invert_match, args.randomize)
        .context("invalid --filter pattern")?;
    let urls = filter.apply(urls);

    if urls.is_empty() {
        info!("No URLs to download");
        return Ok(());
    }

    info!(
        urls = urls.len(),
        download_dir = %args.download_dir.display(),
        dry_run = args.dry_run,
        "starting run"
    );

    let config = EngineConfig {
        max_attempts: args.max_tries,
        base_delay: Duration::from_millis(args.base_delay_ms),
        dry_run: args.dry_run,
        ..EngineConfig::default()
    };
    let runner = Runner::new(config, &args.download_dir);
    let transport = HttpTransport::new();

    // Ctrl-C stops the run between attempts, not mid-write
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; finishing current attempt then stopping");
                cancel.cancel();
            }
        });
    }

    let stats = runner
        .run(
            &urls,
            &args.strip_prefixes,
            args.auto_strip_prefix,
            &transport,
            &cancel,
        )
        .await;

    info!(
        succeeded = stats.succeeded,
        skipped_existing = stats.skipped_existing,
        permanent_failures = stats.permanent_failures,
        exhausted = stats.exhausted,
        unmappable = stats.unmappable,
        total = stats.total(),
        "run complete"
    );

    if !stats.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

/// Initializes tracing to stdout, plus an optional file sink.
///
/// Level priority: RUST_LOG env var > --quiet > --verbose > info.
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

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    if let Some(path) = &args.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        registry.init();
    }
    Ok(())
}
