use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

use super::RateLimitInfo;

/// One logical Bot API call, replayed verbatim on every retry attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// API method name appended after `/bot{token}/`, e.g. `getUpdates`.
    pub endpoint: String,
    /// JSON body for write operations.
    pub body: Option<serde_json::Value>,
    /// Query parameters, sent in insertion order.
    pub query: Vec<(String, String)>,
    /// Overrides the client-wide request timeout for this call.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// `GET` without body.
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            endpoint: endpoint.into(),
            body: None,
            query: Vec::new(),
            timeout: None,
        }
    }

    /// `POST` with a JSON body.
    #[must_use]
    pub fn post(endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            endpoint: endpoint.into(),
            body: Some(body),
            query: Vec::new(),
            timeout: None,
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Per-call timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Successful envelope result plus the quota headers of the final attempt.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// `result` field of the envelope (`null` when absent).
    pub result: serde_json::Value,
    /// Rate-limit headers of the response, if any.
    pub rate_limit: Option<RateLimitInfo>,
}

impl ApiResponse {
    /// Decode `result` into a typed value.
    ///
    /// # Errors
    /// Returns an `Api` error with code 0 when the shape does not match.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        serde_json::from_value(self.result).map_err(|error| {
            ClientError::api(0, "failed to decode response result")
                .with_description(Some(error.to_string()))
        })
    }
}
