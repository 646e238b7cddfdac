use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";
const HEADER_RETRY_AFTER: &str = "retry-after";

/// Quota snapshot read from the rate-limit headers of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// `X-RateLimit-Limit`.
    pub limit: Option<u64>,
    /// `X-RateLimit-Remaining`.
    pub remaining: Option<u64>,
    /// `X-RateLimit-Reset`, unix seconds.
    pub reset: Option<DateTime<Utc>>,
    /// `Retry-After`, seconds.
    pub retry_after: Option<Duration>,
}

impl RateLimitInfo {
    /// Parse the rate-limit headers; header names are matched case-insensitively.
    /// Returns `None` when the response carried none of them.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let info = Self {
            limit: header_u64(headers, HEADER_LIMIT),
            remaining: header_u64(headers, HEADER_REMAINING),
            reset: header_u64(headers, HEADER_RESET)
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            retry_after: parse_retry_after(headers),
        };
        (info != Self::default()).then_some(info)
    }

    /// True when less than 10% of the window quota remains.
    #[must_use]
    pub fn should_back_off(&self) -> bool {
        match (self.limit, self.remaining) {
            (Some(limit), Some(remaining)) if limit > 0 => remaining.saturating_mul(10) < limit,
            _ => false,
        }
    }
}

/// `Retry-After` in whole seconds. HTTP-date values are not honoured.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_u64(headers, HEADER_RETRY_AFTER).map(Duration::from_secs)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
