//! Parsing of server rate-limit signaling from response headers.
//!
//! Servers announce throttling state through several competing header
//! conventions (`RateLimit-*`, `X-RateLimit-*`) plus the standard
//! `Retry-After`. This module normalizes all of them into a single
//! [`RateLimitSignal`], derived fresh from each response and never
//! persisted across requests.
//!
//! The variant lookup is a declarative table of
//! `(canonical field -> ordered candidate header names)` tried in priority
//! order, using the first name present. Extending it to another server
//! convention is a one-line change.

use std::time::{Duration, SystemTime};

use tracing::debug;

use super::constants::RESET_EPOCH_THRESHOLD;
use super::transport::RawResponse;

/// Candidate header names for the `limit` field, in priority order.
const LIMIT_HEADERS: &[&str] = &["ratelimit-limit", "x-ratelimit-limit"];

/// Candidate header names for the `remaining` field, in priority order.
const REMAINING_HEADERS: &[&str] = &["ratelimit-remaining", "x-ratelimit-remaining"];

/// Candidate header names for the `reset` field, in priority order.
const RESET_HEADERS: &[&str] = &["ratelimit-reset", "x-ratelimit-reset"];

/// A reset value, classified as either a duration or an absolute time.
///
/// Servers send both forms under the same header names. Classification
/// uses [`RESET_EPOCH_THRESHOLD`]: values at or above it are Unix
/// timestamps, values below are durations in seconds. Misclassification
/// is a degraded mode, not an error; a timestamp wrongly read as a
/// duration still produces a bounded wait after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetValue {
    /// The window resets after this duration.
    After(Duration),
    /// The window resets at this absolute time.
    At(SystemTime),
}

impl ResetValue {
    /// Time remaining until the reset, from `now`.
    ///
    /// A timestamp already in the past yields zero.
    #[must_use]
    pub fn remaining_from(&self, now: SystemTime) -> Duration {
        match self {
            Self::After(duration) => *duration,
            Self::At(when) => when.duration_since(now).unwrap_or(Duration::ZERO),
        }
    }
}

/// Parsed view of one response's throttling state.
///
/// All fields are optional; servers routinely send a subset or nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSignal {
    /// Explicit wait requested via `Retry-After`.
    pub retry_after: Option<Duration>,
    /// Requests allowed per window.
    pub limit: Option<u64>,
    /// Requests remaining in the current window.
    pub remaining: Option<u64>,
    /// When the current window resets.
    pub reset: Option<ResetValue>,
}

impl RateLimitSignal {
    /// Extracts the rate-limit signal from a response's headers.
    #[must_use]
    pub fn from_response(response: &RawResponse) -> Self {
        let signal = Self {
            retry_after: response.header("retry-after").and_then(parse_retry_after),
            limit: first_integer(response, LIMIT_HEADERS),
            remaining: first_integer(response, REMAINING_HEADERS),
            reset: first_integer(response, RESET_HEADERS).map(classify_reset),
        };
        debug!(?signal, "parsed rate-limit signal");
        signal
    }

    /// Whether the response carried any throttling information at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retry_after.is_none()
            && self.limit.is_none()
            && self.remaining.is_none()
            && self.reset.is_none()
    }
}

/// Returns the value of the first candidate header present, parsed as an
/// unsigned integer. Unparseable values are treated as absent.
fn first_integer(response: &RawResponse, candidates: &[&str]) -> Option<u64> {
    candidates
        .iter()
        .find_map(|name| response.header(name))
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Classifies a raw reset value as a duration or an absolute timestamp.
fn classify_reset(value: u64) -> ResetValue {
    if value >= RESET_EPOCH_THRESHOLD {
        ResetValue::At(SystemTime::UNIX_EPOCH + Duration::from_secs(value))
    } else {
        ResetValue::After(Duration::from_secs(value))
    }
}

/// Parses a `Retry-After` header value into a wait duration.
///
/// Supports both forms from RFC 7231:
/// - integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2026 07:28:00 GMT`
///
/// Returns `None` for negative or unparseable values. An HTTP-date in the
/// past yields zero. Ceiling clamping is applied later, centrally, in the
/// wait computation.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    // Integer seconds first (most common)
    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        return Some(Duration::from_secs(seconds as u64));
    }

    // Then HTTP-date
    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        let now = SystemTime::now();
        match datetime.duration_since(now) {
            Ok(duration) => Some(duration),
            Err(_) => {
                debug!(header_value, "Retry-After date is in the past, returning zero");
                Some(Duration::ZERO)
            }
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}
