//! Retry and backoff policy for listing and attachment requests.
//!
//! Failures are first classified into an [`ErrorKind`], then the policy
//! decides whether another attempt is made and how long to wait before it.

use std::time::Duration;

/// Status codes that are retried instead of returned.
pub const DEFAULT_STATUS_FORCELIST: [u16; 4] = [500, 502, 503, 504];

/// High-level classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or read deadline exceeded.
    Timeout,
    /// Connection refused, reset, DNS failure, truncated body.
    Connection,
    /// The server answered with a status code.
    Status(u16),
    /// Anything else (malformed URL, redirect loop). Not retried.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Exponential backoff: retry `n` (1-based) waits `backoff_factor * 2^(n-1)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub backoff_factor: Duration,
    /// Upper bound on any single delay, including server-provided ones.
    pub max_backoff: Duration,
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
            status_forcelist: DEFAULT_STATUS_FORCELIST.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries. Useful in tests and one-off tools.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        match kind {
            ErrorKind::Timeout | ErrorKind::Connection => true,
            ErrorKind::Status(code) => self.status_forcelist.contains(&code),
            ErrorKind::Other => false,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = 1u32 << retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(exp).min(self.max_backoff)
    }

    /// Decide what to do after attempt `attempt` (1 = first request) failed.
    ///
    /// `retry_after` is a server-provided delay; it is only honoured for 503.
    pub fn decide(
        &self,
        attempt: u32,
        kind: ErrorKind,
        retry_after: Option<Duration>,
    ) -> RetryDecision {
        if attempt > self.max_retries || !self.is_retryable(kind) {
            return RetryDecision::NoRetry;
        }
        let delay = match (kind, retry_after) {
            (ErrorKind::Status(503), Some(d)) => d.min(self.max_backoff),
            _ => self.backoff(attempt),
        };
        RetryDecision::RetryAfter(delay)
    }
}
