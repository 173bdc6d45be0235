//! Per-URL fetch-with-retry state machine.
//!
//! [`RetryEngine::fetch`] drives one URL through
//! `Requesting -> Evaluating -> {Waiting -> Requesting} | Success | Failed`:
//! it issues GETs through an abstract [`Transport`], classifies each
//! response, and sleeps between attempts according to the server's
//! rate-limit signaling (falling back to jittered exponential backoff).
//! Exactly one request is in flight at a time; the `Waiting` state is the
//! only suspension point.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, DEFAULT_RETRY_STATUSES,
    MAX_ATTEMPTS_CEILING,
};
use super::error::FetchError;
use super::rate_limit::RateLimitSignal;
use super::retry::{FailureKind, classify_status, compute_wait};
use super::transport::Transport;
use crate::util::humanize_bytes;

/// One URL paired with its resolved destination path.
///
/// Created once per URL before any network activity; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// The URL to fetch.
    pub url: String,
    /// Where the response body is written on success.
    pub dest: PathBuf,
}

impl DownloadTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
        }
    }
}

/// Immutable engine configuration, constructed once per run and shared
/// read-only by all fetch invocations.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum attempts per URL, including the first. Clamped to
    /// `1..=MAX_ATTEMPTS_CEILING` on construction.
    pub max_attempts: u32,
    /// Base unit for exponential backoff; also bounds the jitter.
    pub base_delay: Duration,
    /// Ceiling on any single inter-attempt wait, whatever its source.
    pub max_delay: Duration,
    /// HTTP 5xx statuses treated as transient (429 always is).
    pub retry_statuses: Vec<u16>,
    /// Skip all network calls and report synthetic successes.
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            dry_run: false,
        }
    }
}

impl EngineConfig {
    /// Creates a config with the given attempt budget, clamped to a sane
    /// range, using defaults for everything else.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_CEILING),
            ..Self::default()
        }
    }
}

/// Cooperative cancellation flag, checked before each attempt.
///
/// Cheap to clone and share with a signal handler; setting it stops the
/// run between attempts without corrupting in-flight state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal outcome of one URL's fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A 2xx response whose body was persisted.
    Success {
        /// Bytes written to the destination (0 in dry-run mode).
        bytes_written: u64,
    },

    /// A failure that retrying cannot fix; reported on the attempt that
    /// observed it.
    PermanentFailure {
        /// Human-readable reason.
        reason: String,
    },

    /// All attempts consumed by transient failures. Distinct from
    /// [`Outcome::PermanentFailure`] so "gave up after N tries" is
    /// distinguishable from "server rejected outright".
    ExhaustedRetries {
        /// Attempts performed.
        attempts: u32,
        /// Reason from the final attempt.
        last_reason: String,
    },
}

impl Outcome {
    /// Whether this outcome is a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One attempt's log entry: attempt number, how it went, and the wait
/// chosen before the next attempt (`None` when terminal).
///
/// Owned by one fetch invocation and discarded once the outcome is
/// reported; only the log records survive.
#[derive(Debug, Clone)]
struct AttemptRecord {
    attempt: u32,
    disposition: String,
    wait: Option<Duration>,
}

/// Result of evaluating a single attempt.
enum Evaluation {
    Success { bytes_written: u64 },
    Permanent { reason: String },
    Transient { reason: String, signal: Option<RateLimitSignal> },
}

/// Fetch-with-retry engine.
///
/// Owns only the configuration; all per-URL state lives on the stack of a
/// single [`fetch`](Self::fetch) call, so one engine serves the whole
/// sequential batch.
#[derive(Debug, Clone)]
pub struct RetryEngine {
    config: EngineConfig,
}

impl RetryEngine {
    /// Creates an engine, clamping the configured attempt budget.
    #[must_use]
    pub fn new(mut config: EngineConfig) -> Self {
        config.max_attempts = config.max_attempts.clamp(1, MAX_ATTEMPTS_CEILING);
        Self { config }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetches one URL, retrying transient failures, and reports the
    /// terminal outcome. Never returns an `Err`; every failure mode is an
    /// [`Outcome`] variant so the caller's batch can continue.
    #[instrument(skip(self, transport, cancel), fields(url = %target.url))]
    pub async fn fetch(
        &self,
        target: &DownloadTarget,
        transport: &dyn Transport,
        cancel: &CancelFlag,
    ) -> Outcome {
        let mut records: Vec<AttemptRecord> = Vec::new();
        let mut last_reason = String::new();

        for attempt in 1..=self.config.max_attempts {
            // Cooperative cancellation, checked before each Requesting
            // transition so an external signal stops the run between
            // attempts.
            if cancel.is_cancelled() {
                warn!(attempt, "cancelled before attempt");
                return Outcome::PermanentFailure {
                    reason: format!("cancelled before attempt {attempt}"),
                };
            }

            // Dry run is an explicit branch: no transport call is made.
            if self.config.dry_run {
                info!(dest = %target.dest.display(), "dry run; would download");
                return Outcome::Success { bytes_written: 0 };
            }

            match self.attempt_once(target, transport).await {
                Evaluation::Success { bytes_written } => {
                    info!(
                        attempt,
                        bytes = bytes_written,
                        size = %humanize_bytes(bytes_written),
                        dest = %target.dest.display(),
                        "downloaded"
                    );
                    debug!(records = ?records, "attempt history");
                    return Outcome::Success { bytes_written };
                }
                Evaluation::Permanent { reason } => {
                    warn!(attempt, %reason, "permanent failure; not retrying");
                    debug!(records = ?records, "attempt history");
                    return Outcome::PermanentFailure { reason };
                }
                Evaluation::Transient { reason, signal } => {
                    last_reason = reason;

                    if attempt == self.config.max_attempts {
                        records.push(AttemptRecord {
                            attempt,
                            disposition: last_reason.clone(),
                            wait: None,
                        });
                        break;
                    }

                    let (wait, source) = compute_wait(signal.as_ref(), attempt, &self.config);
                    info!(
                        attempt,
                        reason = %last_reason,
                        wait_ms = wait.as_millis(),
                        wait_source = %source,
                        "attempt failed; waiting before retry"
                    );
                    records.push(AttemptRecord {
                        attempt,
                        disposition: last_reason.clone(),
                        wait: Some(wait),
                    });
                    tokio::time::sleep(wait).await;
                }
            }
        }

        warn!(
            attempts = self.config.max_attempts,
            reason = %last_reason,
            "retries exhausted"
        );
        debug!(records = ?records, "attempt history");
        Outcome::ExhaustedRetries {
            attempts: self.config.max_attempts,
            last_reason,
        }
    }

    /// Issues one GET and evaluates the result.
    async fn attempt_once(&self, target: &DownloadTarget, transport: &dyn Transport) -> Evaluation {
        let response = match transport.do_get(&target.url).await {
            Ok(response) => response,
            // Transport-level errors (timeout, connection failure) are
            // transient; no rate-limit signal is available.
            Err(error) => {
                return Evaluation::Transient {
                    reason: error.to_string(),
                    signal: None,
                };
            }
        };

        if response.is_success() {
            return match persist_body(&target.dest, &response.body).await {
                Ok(bytes_written) => Evaluation::Success { bytes_written },
                Err(error) => Evaluation::Permanent {
                    reason: error.to_string(),
                },
            };
        }

        let reason = format!("HTTP {}", response.status);
        match classify_status(response.status, &self.config.retry_statuses) {
            FailureKind::Transient => Evaluation::Transient {
                reason,
                signal: Some(RateLimitSignal::from_response(&response)),
            },
            FailureKind::Permanent => Evaluation::Permanent { reason },
        }
    }
}

/// Writes a response body to its destination, creating parent directories
/// as needed.
async fn persist_body(dest: &Path, body: &[u8]) -> Result<u64, FetchError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }
    }
    tokio::fs::write(dest, body)
        .await
        .map_err(|e| FetchError::io(dest, e))?;
    Ok(body.len() as u64)
}
