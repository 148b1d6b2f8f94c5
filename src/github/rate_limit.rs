//! Rate-limit detection and the wait-until-reset step.
//!
//! GitHub reports quota on every response through `x-ratelimit-*` headers.
//! A request is only considered rate limited when the status is 403 or 429
//! *and* the remaining quota is zero; any other 403 is an authorization
//! failure and is left to the caller.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Requests allowed in the current window.
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Requests left in the current window.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Epoch seconds at which the window resets.
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota state parsed from response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Window size, when the header is present.
    pub limit: Option<u64>,
    /// Requests left in the window.
    pub remaining: u64,
    /// Epoch seconds of the next reset.
    pub reset: i64,
}

impl RateLimitInfo {
    /// Parse quota headers. Returns `None` unless both the remaining count
    /// and the reset time are present and numeric.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number(headers, REMAINING_HEADER)?;
        let reset = header_number(headers, RESET_HEADER)?;
        let limit = header_number(headers, LIMIT_HEADER);

        Some(Self {
            limit,
            remaining,
            reset: i64::try_from(reset).ok()?,
        })
    }

    /// Whether the window is used up.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// The reset time as a timestamp, for logging.
    #[must_use]
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }

    /// How long to sleep so the next request lands after the reset.
    ///
    /// `reset - now + 1` seconds; one extra second absorbs clock skew between
    /// us and the API. Never negative.
    #[must_use]
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Duration {
        let secs = self.reset - now.timestamp() + 1;
        Duration::from_secs(u64::try_from(secs).unwrap_or(0))
    }
}

/// Return the quota state if this response means "rate limit exhausted".
#[must_use]
pub fn exhausted_rate_limit(status: StatusCode, headers: &HeaderMap) -> Option<RateLimitInfo> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    RateLimitInfo::from_headers(headers).filter(RateLimitInfo::is_exhausted)
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Blocks the sync while the rate-limit window resets.
///
/// Object-safe so the client can hold `Arc<dyn Sleeper>`; tests swap in a
/// recorder instead of really sleeping.
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(remaining: &str, reset: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LIMIT_HEADER, HeaderValue::from_static("5000"));
        headers.insert(REMAINING_HEADER, HeaderValue::from_str(remaining).unwrap());
        headers.insert(RESET_HEADER, HeaderValue::from_str(reset).unwrap());
        headers
    }

    #[test]
    fn test_from_headers() {
        let info = RateLimitInfo::from_headers(&headers("0", "1700000000")).unwrap();
        assert_eq!(info.limit, Some(5000));
        assert_eq!(info.remaining, 0);
        assert_eq!(info.reset, 1_700_000_000);
        assert!(info.is_exhausted());
    }

    #[test]
    fn test_from_headers_missing_reset() {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("0"));
        assert!(RateLimitInfo::from_headers(&headers).is_none());
    }

    #[test]
    fn test_wait_duration_adds_one_second() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let info = RateLimitInfo {
            limit: None,
            remaining: 0,
            reset: 1_700_000_005,
        };
        assert_eq!(info.wait_duration(now), Duration::from_secs(6));
    }

    #[test]
    fn test_wait_duration_never_negative() {
        let now = DateTime::from_timestamp(1_700_000_100, 0).unwrap();
        let info = RateLimitInfo {
            limit: None,
            remaining: 0,
            reset: 1_700_000_000,
        };
        assert_eq!(info.wait_duration(now), Duration::ZERO);
    }

    #[test]
    fn test_exhausted_requires_forbidden_class_status() {
        let h = headers("0", "1700000000");
        assert!(exhausted_rate_limit(StatusCode::FORBIDDEN, &h).is_some());
        assert!(exhausted_rate_limit(StatusCode::TOO_MANY_REQUESTS, &h).is_some());
        assert!(exhausted_rate_limit(StatusCode::NOT_FOUND, &h).is_none());
        assert!(exhausted_rate_limit(StatusCode::OK, &h).is_none());
    }

    #[test]
    fn test_forbidden_with_quota_left_is_not_rate_limited() {
        let h = headers("42", "1700000000");
        assert!(exhausted_rate_limit(StatusCode::FORBIDDEN, &h).is_none());
    }
}
