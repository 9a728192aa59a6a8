//! Retry policy shared by the HTTP adapters.

use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY_CHARS: usize = 800;

/// Retry limits for outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Returns a policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
        }
    }

    pub(crate) fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts.max(1)
    }

    pub(crate) fn delay(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        if let Some(delay) = retry_after {
            return delay.max(self.base_delay).min(MAX_BACKOFF);
        }
        let exponent = u32::try_from(attempt.saturating_sub(1).min(10)).unwrap_or(10);
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(MAX_BACKOFF)
    }
}

pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let raw = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

pub(crate) const fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

pub(crate) fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

pub(crate) fn truncate_for_error(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        return text.to_owned();
    }
    let mut truncated: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}
