//! Error taxonomy shared by the executor, the poller and the webhook gate.

use std::time::Duration;

use crate::api::RateLimitInfo;

/// Coarse classification of a failed API interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure (connect, timeout, cancellation).
    Network,
    /// Credential rejected by the Bot API (401/403).
    Auth,
    /// Caller input rejected before any request was issued.
    Validation,
    /// Rate limited by the Bot API (429).
    RateLimit,
    /// Any other non-success envelope or undecodable response.
    Api,
}

impl ErrorKind {
    /// Lowercase label used in logs and error text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::RateLimit => "rate_limit",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal error of one logical Bot API call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} error (code={code}): {message}{}", description_suffix(.description.as_ref()))]
pub struct ClientError {
    /// Error classification.
    pub kind: ErrorKind,
    /// HTTP status or remote `error_code`; 0 when neither is known.
    pub code: i64,
    /// Short human-readable summary.
    pub message: String,
    /// Remote `description`, when the envelope carried one.
    pub description: Option<String>,
    /// `Retry-After` hint attached to rate-limit errors.
    pub retry_after: Option<Duration>,
    /// Rate-limit headers observed on the failing response.
    pub rate_limit: Option<RateLimitInfo>,
}

impl ClientError {
    fn new(kind: ErrorKind, code: i64, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            description: None,
            retry_after: None,
            rate_limit: None,
        }
    }

    /// Transport failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, 0, message)
    }

    /// Loop or call cancelled by its owner.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::network("request cancelled")
    }

    /// Rejected credential.
    #[must_use]
    pub fn auth(code: i64, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, code, message)
    }

    /// Invalid caller input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, 400, message)
    }

    /// 429 with an optional `Retry-After` hint.
    #[must_use]
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        let mut error = Self::new(ErrorKind::RateLimit, 429, message);
        error.retry_after = retry_after;
        error
    }

    /// Generic API failure.
    #[must_use]
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, code, message)
    }

    /// Attach the remote `description`.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Attach rate-limit headers; fills `retry_after` from them when unset.
    #[must_use]
    pub fn with_rate_limit(mut self, info: RateLimitInfo) -> Self {
        if self.retry_after.is_none() && self.kind == ErrorKind::RateLimit {
            self.retry_after = info.retry_after;
        }
        self.rate_limit = Some(info);
        self
    }

    /// Whether the default policy would retry this error.
    ///
    /// Network and rate-limit failures are transient; API failures only in the
    /// 5xx range.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Network | ErrorKind::RateLimit => true,
            ErrorKind::Auth | ErrorKind::Validation => false,
            ErrorKind::Api => self.is_server_error(),
        }
    }

    pub(crate) fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.code)
    }
}

fn description_suffix(description: Option<&String>) -> String {
    description.map(|d| format!(" - {d}")).unwrap_or_default()
}

/// Why a webhook signature check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Request body was empty.
    #[error("webhook payload is empty")]
    EmptyPayload,
    /// Signature header missing or blank.
    #[error("webhook signature is empty")]
    EmptySignature,
    /// No secret configured for verification.
    #[error("webhook secret is empty")]
    EmptySecret,
    /// Digest did not match the payload.
    #[error("webhook signature mismatch")]
    Mismatch,
}

/// Failure turning an inbound webhook body into an [`crate::Update`].
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Signature gate rejected the request.
    #[error(transparent)]
    Rejected(#[from] SignatureError),

    /// Body empty after verification was skipped.
    #[error("webhook payload is empty")]
    EmptyPayload,

    /// Body is not valid JSON of either accepted shape.
    #[error("malformed webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Push event with an `event_name` this client does not map.
    #[error("unsupported webhook event: {0}")]
    UnsupportedEvent(String),

    /// Envelope decoded but violates the update invariants.
    #[error("invalid webhook update: {0}")]
    InvalidUpdate(String),
}
