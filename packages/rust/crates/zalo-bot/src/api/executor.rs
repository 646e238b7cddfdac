use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::config::{BotConfig, Environment};
use crate::error::ClientError;
use crate::retry::{RetryConfig, classify_response, classify_transport};

use super::{ApiRequest, ApiResponse, RateLimitInfo};

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("zalo-bot-rs/", env!("CARGO_PKG_VERSION"));
const ENVIRONMENT_HEADER: &str = "X-Environment";

/// Executes Bot API calls with credential embedding, envelope parsing and retries.
///
/// Stateless apart from its immutable configuration; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http: reqwest::Client,
    base_url: String,
    token: String,
    development: bool,
    retry: RetryConfig,
}

impl RequestExecutor {
    /// Build an executor with its own HTTP client.
    #[must_use]
    pub fn new(config: &BotConfig) -> Self {
        Self::with_client(build_http_client(config), config)
    }

    /// Build an executor on top of an existing HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, config: &BotConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            development: config.is_development(),
            retry: config.retry.clone(),
        }
    }

    /// Policy applied by [`RequestExecutor::execute`].
    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/bot{}/{endpoint}", self.base_url, self.token)
    }

    /// Run one logical call, retrying per the configured policy.
    ///
    /// The in-flight request and every backoff sleep race `cancel`; a cancelled
    /// call returns a `Network` error immediately.
    ///
    /// # Errors
    /// Returns the last classified error once retries are exhausted or the
    /// error is not retryable.
    pub async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, ClientError> {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::cancelled());
            }
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ClientError::cancelled()),
                outcome = self.send_once(request) => outcome,
            };
            let error = match outcome {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            if !self.retry.should_retry(&error, attempt) {
                return Err(error);
            }

            let delay = self.retry.delay_for(&error, attempt);
            tracing::warn!(
                endpoint = %request.endpoint,
                attempt = attempt + 1,
                max_retries = self.retry.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Bot API call failed; retrying"
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ClientError::cancelled()),
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.api_url(&request.endpoint))
            .header(CONTENT_TYPE, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if self.development {
            builder = builder.header(ENVIRONMENT_HEADER, Environment::Development.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        // reqwest errors embed the URL, which carries the token.
        let response = builder
            .send()
            .await
            .map_err(|error| classify_transport(&error.without_url()))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|error| classify_transport(&error.without_url()))?;
        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            status = status.as_u16(),
            bytes = body.len(),
            "Bot API response"
        );

        let envelope = classify_response(status, &headers, &body)?;
        Ok(ApiResponse {
            result: envelope.result.unwrap_or(serde_json::Value::Null),
            rate_limit: RateLimitInfo::from_headers(&headers),
        })
    }
}

fn build_http_client(config: &BotConfig) -> reqwest::Client {
    match reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
    {
        Ok(client) => client,
        Err(error) => {
            tracing::warn!(
                error = %error,
                "Failed to build Bot API HTTP client with timeouts; falling back to default client"
            );
            reqwest::Client::new()
        }
    }
}
