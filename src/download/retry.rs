//! Failure classification and inter-attempt wait computation.
//!
//! When an attempt fails, the result is classified into a [`FailureKind`]:
//! transient failures are retried up to the configured maximum, permanent
//! failures are reported immediately. For retryable failures,
//! [`compute_wait`] decides how long to sleep before the next attempt,
//! honoring server-declared limits before falling back to exponential
//! backoff with jitter.

use std::time::{Duration, SystemTime};

use rand::Rng;
use tracing::debug;

use super::engine::EngineConfig;
use super::rate_limit::RateLimitSignal;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: HTTP 429, configured 5xx statuses, network timeout,
    /// connection refused.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404 Not Found, 400 Bad Request. Client errors other than
    /// 429 are not transient.
    Permanent,
}

/// Where a chosen wait came from, for per-attempt logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitSource {
    /// Explicit `Retry-After` header.
    RetryAfter,
    /// Quota exhausted (`remaining == 0`); waiting out the reset window.
    ResetWindow,
    /// Exponential backoff with jitter.
    Backoff,
}

impl std::fmt::Display for WaitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RetryAfter => write!(f, "retry-after"),
            Self::ResetWindow => write!(f, "reset-window"),
            Self::Backoff => write!(f, "backoff"),
        }
    }
}

/// Classifies an HTTP error status.
///
/// 429 is always transient; 5xx statuses are transient only when listed in
/// the configured retry set. Everything else, including unlisted 5xx and
/// all other 4xx, is permanent.
#[must_use]
pub fn classify_status(status: u16, retry_statuses: &[u16]) -> FailureKind {
    match status {
        429 => FailureKind::Transient,
        status if retry_statuses.contains(&status) => FailureKind::Transient,
        _ => FailureKind::Permanent,
    }
}

/// Computes the wait before the next attempt.
///
/// Precedence:
/// 1. an explicit `Retry-After` value, when present;
/// 2. the reset window, when the server reports `remaining == 0` together
///    with a reset signal;
/// 3. exponential backoff: `base * 2^(attempt-1)` plus random jitter in
///    `[0, base)`.
///
/// `remaining` without a reset signal falls through to backoff; there is no
/// reset data to derive a wait from. Every wait, whatever its source, is
/// clamped to `config.max_delay` so pathological header values cannot stall
/// the run.
///
/// `attempt` is the 1-indexed attempt that just failed.
#[must_use]
pub fn compute_wait(
    signal: Option<&RateLimitSignal>,
    attempt: u32,
    config: &EngineConfig,
) -> (Duration, WaitSource) {
    if let Some(signal) = signal {
        if let Some(retry_after) = signal.retry_after {
            return (retry_after.min(config.max_delay), WaitSource::RetryAfter);
        }
        if signal.remaining == Some(0) {
            if let Some(reset) = signal.reset {
                let wait = reset.remaining_from(SystemTime::now());
                return (wait.min(config.max_delay), WaitSource::ResetWindow);
            }
            debug!("remaining quota is 0 but no reset signal; using backoff");
        }
    }

    (backoff_delay(attempt, config), WaitSource::Backoff)
}

/// Exponential backoff: `base * 2^(attempt-1)` plus jitter in `[0, base)`,
/// clamped to the configured ceiling.
///
/// Jitter desynchronizes retries of URLs that failed at the same moment.
#[allow(clippy::cast_possible_truncation)]
fn backoff_delay(attempt: u32, config: &EngineConfig) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exponent = attempt.saturating_sub(1).min(63);
    let delay_ms = base_ms.saturating_mul(1_u64 << exponent);

    let jitter_ms = if base_ms > 0 {
        rand::thread_rng().gen_range(0..base_ms)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter_ms)).min(config.max_delay)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::constants::DEFAULT_RETRY_STATUSES;
    use crate::download::rate_limit::ResetValue;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_classify_429_transient() {
        assert_eq!(
            classify_status(429, &DEFAULT_RETRY_STATUSES),
            FailureKind::Transient
        );
    }

    #[test]
    fn test_classify_default_5xx_set_transient() {
        for status in [500, 502, 503, 504] {
            assert_eq!(
                classify_status(status, &DEFAULT_RETRY_STATUSES),
                FailureKind::Transient,
                "status {status} should be transient"
            );
        }
    }

    #[test]
    fn test_classify_4xx_permanent() {
        for status in [400, 401, 403, 404, 410, 451] {
            assert_eq!(
                classify_status(status, &DEFAULT_RETRY_STATUSES),
                FailureKind::Permanent,
                "status {status} should be permanent"
            );
        }
    }

    #[test]
    fn test_classify_5xx_outside_configured_set_permanent() {
        assert_eq!(
            classify_status(501, &DEFAULT_RETRY_STATUSES),
            FailureKind::Permanent
        );
    }

    #[test]
    fn test_classify_respects_custom_retry_set() {
        assert_eq!(classify_status(501, &[501]), FailureKind::Transient);
        assert_eq!(classify_status(503, &[501]), FailureKind::Permanent);
    }

    // ==================== Wait Precedence Tests ====================

    #[test]
    fn test_wait_retry_after_takes_precedence() {
        let signal = RateLimitSignal {
            retry_after: Some(Duration::from_secs(5)),
            remaining: Some(0),
            reset: Some(ResetValue::After(Duration::from_secs(99))),
            ..RateLimitSignal::default()
        };
        let (wait, source) = compute_wait(Some(&signal), 1, &config());
        assert_eq!(wait, Duration::from_secs(5));
        assert_eq!(source, WaitSource::RetryAfter);
    }

    #[test]
    fn test_wait_retry_after_exact_no_jitter() {
        // Retry-After is an explicit server instruction; it is honored as-is
        // regardless of backoff defaults.
        let signal = RateLimitSignal {
            retry_after: Some(Duration::from_secs(5)),
            ..RateLimitSignal::default()
        };
        for attempt in 1..=5 {
            let (wait, _) = compute_wait(Some(&signal), attempt, &config());
            assert_eq!(wait, Duration::from_secs(5));
        }
    }

    #[test]
    fn test_wait_reset_window_when_quota_exhausted() {
        let signal = RateLimitSignal {
            remaining: Some(0),
            reset: Some(ResetValue::After(Duration::from_secs(30))),
            ..RateLimitSignal::default()
        };
        let (wait, source) = compute_wait(Some(&signal), 1, &config());
        assert_eq!(wait, Duration::from_secs(30));
        assert_eq!(source, WaitSource::ResetWindow);
    }

    #[test]
    fn test_wait_quota_left_ignores_reset() {
        let signal = RateLimitSignal {
            remaining: Some(3),
            reset: Some(ResetValue::After(Duration::from_secs(30))),
            ..RateLimitSignal::default()
        };
        let (_, source) = compute_wait(Some(&signal), 1, &config());
        assert_eq!(source, WaitSource::Backoff);
    }

    #[test]
    fn test_wait_remaining_zero_without_reset_falls_back_to_backoff() {
        let signal = RateLimitSignal {
            remaining: Some(0),
            ..RateLimitSignal::default()
        };
        let (_, source) = compute_wait(Some(&signal), 1, &config());
        assert_eq!(source, WaitSource::Backoff);
    }

    #[test]
    fn test_wait_no_signal_uses_backoff() {
        let (_, source) = compute_wait(None, 1, &config());
        assert_eq!(source, WaitSource::Backoff);
    }

    // ==================== Ceiling Tests ====================

    #[test]
    fn test_wait_retry_after_clamped_to_ceiling() {
        let signal = RateLimitSignal {
            retry_after: Some(Duration::from_secs(86_400)),
            ..RateLimitSignal::default()
        };
        let (wait, _) = compute_wait(Some(&signal), 1, &config());
        assert_eq!(wait, config().max_delay);
    }

    #[test]
    fn test_wait_reset_window_clamped_to_ceiling() {
        let signal = RateLimitSignal {
            remaining: Some(0),
            reset: Some(ResetValue::After(Duration::from_secs(999_999))),
            ..RateLimitSignal::default()
        };
        let (wait, _) = compute_wait(Some(&signal), 1, &config());
        assert_eq!(wait, config().max_delay);
    }

    #[test]
    fn test_backoff_never_exceeds_ceiling() {
        let config = config();
        for attempt in 1..=30 {
            let (wait, _) = compute_wait(None, attempt, &config);
            assert!(
                wait <= config.max_delay,
                "attempt {attempt} wait {wait:?} exceeds ceiling"
            );
        }
    }

    // ==================== Backoff Shape Tests ====================

    #[test]
    fn test_backoff_bounds_per_attempt() {
        // attempt n: base * 2^(n-1) <= wait < base * 2^(n-1) + base
        let config = config();
        let base = config.base_delay;
        for attempt in 1..=5_u32 {
            let floor = base * 2_u32.pow(attempt - 1);
            let (wait, _) = compute_wait(None, attempt, &config);
            assert!(wait >= floor, "attempt {attempt}: {wait:?} below {floor:?}");
            assert!(
                wait < floor + base,
                "attempt {attempt}: {wait:?} at or above {:?}",
                floor + base
            );
        }
    }

    #[test]
    fn test_backoff_non_decreasing_in_expectation() {
        // Jitter is bounded by base, so the floor of attempt n+1 is at or
        // above the ceiling of attempt n from attempt 2 onward; spot-check
        // with samples.
        let config = config();
        for attempt in 2..=6_u32 {
            for _ in 0..20 {
                let (earlier, _) = compute_wait(None, attempt - 1, &config);
                let (later, _) = compute_wait(None, attempt, &config);
                assert!(
                    later.as_millis() + config.base_delay.as_millis() > earlier.as_millis(),
                    "attempt {attempt} regressed: {earlier:?} -> {later:?}"
                );
            }
        }
    }

    #[test]
    fn test_backoff_zero_base_yields_zero_wait() {
        let config = EngineConfig {
            base_delay: Duration::ZERO,
            ..EngineConfig::default()
        };
        let (wait, _) = compute_wait(None, 3, &config);
        assert_eq!(wait, Duration::ZERO);
    }

    #[test]
    fn test_backoff_large_attempt_does_not_overflow() {
        let (wait, _) = compute_wait(None, u32::MAX, &config());
        assert_eq!(wait, config().max_delay);
    }
}
