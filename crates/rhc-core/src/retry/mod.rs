//! Retry and backoff policy.
//!
//! Encapsulates error classification (timeouts, connection failures, server
//! errors) and exponential backoff decisions so the transfer loop applies a
//! single consistent policy to every attempt.

mod classify;

pub use classify::{classify, classify_curl_error, classify_http_status};

use std::time::Duration;

/// High-level classification of an attempt failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Attempt exceeded the per-attempt deadline.
    Timeout,
    /// Network-level failure with no HTTP status (DNS, connect, reset).
    Connection,
    /// Server error status; presumed transient.
    Http5xx(u16),
    /// Everything else: fatal statuses (1xx/3xx/4xx), local I/O, abort.
    /// Never retried.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with an attempt budget and a per-attempt
/// deadline.
///
/// The backoff before retrying attempt `n` (1-based) is
/// `min(max_delay, 2^n * base_delay)`. Not randomized; the exponent base is
/// fixed at 2.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay multiplied by the growing exponent.
    pub base_delay: Duration,
    /// Upper bound on any single backoff delay.
    pub max_delay: Duration,
    /// Wall-clock budget for one attempt (connect through body).
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5 * 60),
            attempt_timeout: Duration::from_secs(15 * 60),
        }
    }
}

impl RetryPolicy {
    /// Compute the retry decision for a failed attempt.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns
    /// `RetryDecision::NoRetry` when the error kind is not transient or the
    /// attempt budget is spent.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Timeout | ErrorKind::Connection | ErrorKind::Http5xx(_) => {
                // 2^attempt, clamped so the shift cannot overflow; max_delay
                // caps the result long before the clamp matters.
                let exp = 1u32 << attempt.min(20);
                let raw = self.base_delay.saturating_mul(exp);
                RetryDecision::RetryAfter(raw.min(self.max_delay))
            }
        }
    }
}
