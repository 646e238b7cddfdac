use std::collections::HashSet;
use std::time::Duration;

use crate::error::{ClientError, ErrorKind};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
/// Upper bound applied to a server-supplied `Retry-After` hint.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Exponential backoff policy applied by the request executor.
///
/// Holds no mutable state; clone it freely across tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on any computed delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays; values below 1 act as 1.
    pub backoff_factor: f64,
    /// Kinds retried besides 5xx API errors.
    pub retryable_kinds: HashSet<ErrorKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            retryable_kinds: HashSet::from([ErrorKind::Network, ErrorKind::RateLimit]),
        }
    }
}

impl RetryConfig {
    /// Policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set `max_retries`.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set initial and maximum delay.
    #[must_use]
    pub fn with_delays(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Decide whether a failed attempt should be retried.
    ///
    /// `attempt` counts retries already performed (0 after the first failure).
    /// Errors that are not [`ClientError`] are assumed transient.
    #[must_use]
    pub fn should_retry(&self, error: &(dyn std::error::Error + 'static), attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match error.downcast_ref::<ClientError>() {
            Some(client_error) => self.is_retryable(client_error),
            None => true,
        }
    }

    fn is_retryable(&self, error: &ClientError) -> bool {
        match error.kind {
            ErrorKind::Auth | ErrorKind::Validation => false,
            kind if self.retryable_kinds.contains(&kind) => true,
            ErrorKind::Api => error.is_server_error(),
            _ => false,
        }
    }

    /// `min(initial_delay * backoff_factor^attempt, max_delay)`.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }
        let factor = if self.backoff_factor.is_finite() {
            self.backoff_factor.max(1.0)
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(secs).map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Backoff for `attempt`, raised to the error's `Retry-After` hint (capped at 60s).
    #[must_use]
    pub fn delay_for(&self, error: &ClientError, attempt: u32) -> Duration {
        let backoff = self.next_delay(attempt);
        match error.retry_after {
            Some(hint) => backoff.max(hint.min(MAX_RETRY_AFTER)),
            None => backoff,
        }
    }
}
