//! Constants for the download module (timeouts, wait ceilings).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default maximum attempts per URL (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Hard ceiling on configurable attempts, keeping total run time bounded.
pub const MAX_ATTEMPTS_CEILING: u32 = 20;

/// Default base unit for exponential backoff (1 second).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default ceiling on any single inter-attempt wait (1 hour).
///
/// Applied to every wait source, including pathological `Retry-After` and
/// reset header values.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3600);

/// HTTP 5xx statuses retried by default.
pub const DEFAULT_RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Reset values at or above this are Unix timestamps, below are durations
/// in seconds. Servers disagree on which form they send; one billion
/// (September 2001) is comfortably past any plausible reset duration.
pub const RESET_EPOCH_THRESHOLD: u64 = 1_000_000_000;
