//! Sequential batch runner.
//!
//! Destinations for the whole batch are resolved up front (auto prefix
//! detection needs every path), then each URL is fetched strictly one at a
//! time. One URL's failure never aborts the batch; every terminal outcome
//! is counted and the summary reports per-outcome totals.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::download::{
    CancelFlag, DownloadTarget, EngineConfig, Outcome, RetryEngine, Transport,
};
use crate::mapper::{PathMapper, ResolvedPath};
use crate::util::humanize_seconds;

/// Per-outcome counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// URLs downloaded (or simulated in dry-run mode).
    pub succeeded: usize,
    /// URLs rejected outright (non-retryable failures).
    pub permanent_failures: usize,
    /// URLs given up on after the attempt budget.
    pub exhausted: usize,
    /// URLs skipped because the destination already exists.
    pub skipped_existing: usize,
    /// URLs with no usable destination path.
    pub unmappable: usize,
}

impl RunStats {
    /// Total URLs processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded
            + self.permanent_failures
            + self.exhausted
            + self.skipped_existing
            + self.unmappable
    }

    /// Whether every URL reached success (existing files count as clean).
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.permanent_failures == 0 && self.exhausted == 0 && self.unmappable == 0
    }
}

/// Sequential download runner: one in-flight request at a time, by design.
///
/// The target servers are rate-limited; parallelism would only trigger
/// more throttling.
#[derive(Debug)]
pub struct Runner {
    engine: RetryEngine,
    download_dir: PathBuf,
}

impl Runner {
    /// Creates a runner writing under `download_dir`.
    #[must_use]
    pub fn new(config: EngineConfig, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: RetryEngine::new(config),
            download_dir: download_dir.into(),
        }
    }

    /// Downloads the batch and returns per-outcome counts.
    pub async fn run(
        &self,
        urls: &[String],
        explicit_prefixes: &[String],
        auto_detect_prefix: bool,
        transport: &dyn Transport,
        cancel: &CancelFlag,
    ) -> RunStats {
        let resolved = PathMapper::resolve(urls, explicit_prefixes, auto_detect_prefix);
        let total = urls.len();
        let mut stats = RunStats::default();

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
        {
            bar.set_style(style);
        }

        let started = std::time::Instant::now();

        for (i, (url, resolved)) in urls.iter().zip(resolved).enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    remaining = total - i,
                    "run cancelled; skipping remaining URLs"
                );
                break;
            }

            #[allow(clippy::cast_precision_loss)]
            let percent = 100.0 * (i + 1) as f64 / total as f64;
            info!(url = %url, "downloading {}/{total} ({percent:.2}%)", i + 1);
            bar.set_message(url.clone());

            let relative = match resolved {
                ResolvedPath::Relative(path) => path,
                ResolvedPath::Unmappable { reason } => {
                    warn!(url = %url, %reason, "skipping unmappable URL");
                    stats.unmappable += 1;
                    bar.inc(1);
                    continue;
                }
            };
            let target = DownloadTarget::new(url.clone(), self.download_dir.join(relative));

            if !self.engine.config().dry_run && target.dest.exists() {
                info!(dest = %target.dest.display(), "already exists, skipping");
                stats.skipped_existing += 1;
                bar.inc(1);
                continue;
            }

            match self.engine.fetch(&target, transport, cancel).await {
                Outcome::Success { bytes_written } => {
                    debug!(url = %url, bytes_written, "success");
                    stats.succeeded += 1;
                }
                Outcome::PermanentFailure { reason } => {
                    warn!(url = %url, %reason, "failed permanently");
                    stats.permanent_failures += 1;
                }
                Outcome::ExhaustedRetries {
                    attempts,
                    last_reason,
                } => {
                    warn!(url = %url, attempts, %last_reason, "gave up after retries");
                    stats.exhausted += 1;
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        info!(
            elapsed = %humanize_seconds(started.elapsed().as_secs()),
            "batch finished"
        );
        stats
    }
}
