//! Client configuration: credentials, endpoint, timeouts, retry policy.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;
use crate::retry::RetryConfig;

/// Public Bot API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://bot-api.zapps.me";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UPDATE_QUEUE_CAPACITY: usize = 100;
const MIN_TOKEN_SECRET_LEN: usize = 10;

const ENV_TOKEN: &str = "ZALO_BOT_TOKEN";
const ENV_BASE_URL: &str = "ZALO_BOT_API_BASE_URL";
const ENV_ENVIRONMENT: &str = "ZALO_BOT_ENVIRONMENT";
const ENV_TIMEOUT_SECS: &str = "ZALO_BOT_TIMEOUT_SECS";
const ENV_MAX_RETRIES: &str = "ZALO_BOT_MAX_RETRIES";
const ENV_UPDATE_QUEUE_CAPACITY: &str = "ZALO_BOT_UPDATE_QUEUE_CAPACITY";

/// Deployment environment reported to the Bot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Live traffic; no marker header.
    #[default]
    Production,
    /// Sends `X-Environment: development`.
    Development,
}

impl Environment {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(format!(
                "unknown environment `{other}` (expected production or development)"
            )),
        }
    }
}

/// Settings for one [`crate::ZaloBot`] instance.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// `<bot id>:<secret>` credential, embedded in every request path.
    pub bot_token: String,
    /// API base URL without trailing `/bot...` segment.
    pub base_url: String,
    /// Default per-request timeout.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Deployment environment.
    pub environment: Environment,
    /// Retry policy applied to every call.
    pub retry: RetryConfig,
    /// Capacity of the bounded update stream handed out by polling.
    pub update_queue_capacity: usize,
}

impl BotConfig {
    /// Defaults for everything but the token.
    #[must_use]
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            environment: Environment::default(),
            retry: RetryConfig::default(),
            update_queue_capacity: DEFAULT_UPDATE_QUEUE_CAPACITY,
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the update queue capacity (minimum 1).
    #[must_use]
    pub fn with_update_queue_capacity(mut self, capacity: usize) -> Self {
        self.update_queue_capacity = capacity.max(1);
        self
    }

    /// Whether requests should carry the development marker header.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Load from `ZALO_BOT_*` environment variables.
    ///
    /// # Errors
    /// Returns a validation error when `ZALO_BOT_TOKEN` is missing or malformed.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`BotConfig::from_env`] over an arbitrary lookup.
    ///
    /// # Errors
    /// Returns a validation error when the token is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ENV_TOKEN)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| ClientError::validation(format!("{ENV_TOKEN} is not set")))?;
        let mut config = Self::new(token);

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|raw| !raw.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_ENVIRONMENT) {
            match raw.parse::<Environment>() {
                Ok(environment) => config.environment = environment,
                Err(error) => tracing::warn!(
                    env_var = ENV_ENVIRONMENT,
                    value = %raw,
                    error = %error,
                    "invalid environment value; using production"
                ),
            }
        }
        config.request_timeout = Duration::from_secs(resolve_positive(
            &lookup,
            ENV_TIMEOUT_SECS,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        config.update_queue_capacity = resolve_positive(
            &lookup,
            ENV_UPDATE_QUEUE_CAPACITY,
            DEFAULT_UPDATE_QUEUE_CAPACITY,
        );
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            match raw.trim().parse::<u32>() {
                Ok(value) => config.retry.max_retries = value,
                Err(_) => tracing::warn!(
                    env_var = ENV_MAX_RETRIES,
                    value = %raw,
                    "invalid max retries value; using default"
                ),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the token shape and base URL.
    ///
    /// # Errors
    /// Returns a validation error describing the first problem found.
    pub fn validate(&self) -> Result<(), ClientError> {
        validate_bot_token(&self.bot_token)?;
        let base = self.base_url.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ClientError::validation(format!(
                "base url must be http(s): {base}"
            )));
        }
        Ok(())
    }
}

/// Accepts `<numeric bot id>:<at least 10 of [A-Za-z0-9_-]>`.
///
/// # Errors
/// Returns a validation error when the token does not match.
pub fn validate_bot_token(token: &str) -> Result<(), ClientError> {
    let Some((bot_id, secret)) = token.split_once(':') else {
        return Err(ClientError::validation(
            "bot token must look like <bot_id>:<secret>",
        ));
    };
    if bot_id.is_empty() || !bot_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClientError::validation("bot token id must be numeric"));
    }
    let secret_ok = secret.len() >= MIN_TOKEN_SECRET_LEN
        && secret
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if !secret_ok {
        return Err(ClientError::validation(
            "bot token secret must be at least 10 characters of [A-Za-z0-9_-]",
        ));
    }
    Ok(())
}

fn resolve_positive<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Copy,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            tracing::warn!(
                env_var = %name,
                value = %raw,
                "invalid config env value; using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::ErrorKind;

    const TOKEN: &str = "123456789:abcdefghij_K-L";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn token_shape_is_validated() {
        assert!(validate_bot_token(TOKEN).is_ok());
        for bad in ["", "abc", "12a:abcdefghijk", ":abcdefghijk", "123:short", "123:has space12"] {
            let Err(error) = validate_bot_token(bad) else {
                panic!("{bad:?} should be rejected");
            };
            assert_eq!(error.kind, ErrorKind::Validation);
        }
    }

    #[test]
    fn lookup_applies_overrides_and_defaults() {
        let Ok(config) = BotConfig::from_lookup(lookup(&[
            (ENV_TOKEN, TOKEN),
            (ENV_BASE_URL, "http://127.0.0.1:9000"),
            (ENV_ENVIRONMENT, "dev"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_MAX_RETRIES, "1"),
            (ENV_UPDATE_QUEUE_CAPACITY, "0"),
        ])) else {
            panic!("config should load");
        };
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert!(config.is_development());
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.update_queue_capacity, DEFAULT_UPDATE_QUEUE_CAPACITY);
    }

    #[test]
    fn missing_token_is_a_validation_error() {
        let Err(error) = BotConfig::from_lookup(lookup(&[])) else {
            panic!("missing token must fail");
        };
        assert_eq!(error.kind, ErrorKind::Validation);
    }
}
