//! `ZaloBot`: the client façade tying configuration, executor, poller and
//! webhook verification together.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiRequest, ApiResponse, RequestExecutor};
use crate::config::BotConfig;
use crate::error::{ClientError, SignatureError, WebhookError};
use crate::polling::{PollingEngine, PollingStatus, UpdateStream};
use crate::types::{Message, Update, UpdateConfig, User, UserProfile, WebhookInfo};
use crate::webhook::{WebhookApp, WebhookVerifier, build_webhook_app};

/// Longest user id `getUserProfile` accepts.
const MAX_USER_ID_LEN: usize = 100;

/// Bot API client.
///
/// One instance owns at most one polling session. All calls share a root
/// cancellation token that [`ZaloBot::close`] cancels.
pub struct ZaloBot {
    config: BotConfig,
    executor: Arc<RequestExecutor>,
    polling: PollingEngine,
    webhook: RwLock<WebhookVerifier>,
    shutdown: CancellationToken,
}

impl ZaloBot {
    /// Validate `config` and build the client.
    ///
    /// # Errors
    /// Returns a validation error for a malformed token or base URL.
    pub fn new(config: BotConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let executor = Arc::new(RequestExecutor::new(&config));
        let shutdown = CancellationToken::new();
        let polling = PollingEngine::new(
            Arc::clone(&executor),
            config.request_timeout,
            config.update_queue_capacity,
            shutdown.child_token(),
        );
        Ok(Self {
            config,
            executor,
            polling,
            webhook: RwLock::new(WebhookVerifier::default()),
            shutdown,
        })
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Execute an arbitrary Bot API request through the retrying executor.
    ///
    /// # Errors
    /// Returns the classified error of the call.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        self.executor.execute(request, &self.shutdown).await
    }

    /// `getMe`: the bot's own identity.
    ///
    /// # Errors
    /// Returns the classified error of the call.
    pub async fn get_me(&self) -> Result<User, ClientError> {
        self.call(&ApiRequest::get("getMe")).await?.decode()
    }

    /// One `getUpdates` call. A reply without `result` is an empty batch.
    ///
    /// # Errors
    /// Returns the classified error of the call.
    pub async fn get_updates(&self, config: &UpdateConfig) -> Result<Vec<Update>, ClientError> {
        let request = config.request(config.offset, self.config.request_timeout);
        let updates: Option<Vec<Update>> = self.call(&request).await?.decode()?;
        Ok(updates.unwrap_or_default())
    }

    /// `getUserProfile` for one user.
    ///
    /// # Errors
    /// Returns a validation error for a blank or over-long user id without
    /// issuing a request, otherwise the classified error of the call.
    pub async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        if user_id.trim().is_empty() {
            return Err(ClientError::validation("user id is required"));
        }
        if user_id.chars().count() > MAX_USER_ID_LEN {
            return Err(ClientError::validation("user id is too long"));
        }
        let request = ApiRequest::get("getUserProfile").query("user_id", user_id);
        self.call(&request).await?.decode()
    }

    /// `sendMessage` with a plain text body.
    ///
    /// # Errors
    /// Returns a validation error for an empty chat id or text without issuing
    /// a request, otherwise the classified error of the call.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message, ClientError> {
        if chat_id.trim().is_empty() {
            return Err(ClientError::validation("chat id is required"));
        }
        if text.trim().is_empty() {
            return Err(ClientError::validation("message text is required"));
        }
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        self.call(&ApiRequest::post("sendMessage", body)).await?.decode()
    }

    /// `setWebhook`. A non-empty `secret` also becomes the verification secret.
    ///
    /// # Errors
    /// Returns a validation error for a non-HTTPS URL before any request.
    pub async fn set_webhook(&self, url: &str, secret: &str) -> Result<(), ClientError> {
        validate_webhook_url(url)?;
        let body = serde_json::json!({ "url": url, "secret_token": secret });
        self.call(&ApiRequest::post("setWebhook", body)).await?;
        if !secret.trim().is_empty() {
            self.set_webhook_secret(secret).await;
        }
        tracing::info!("Webhook registered");
        Ok(())
    }

    /// `deleteWebhook`.
    ///
    /// # Errors
    /// Returns the classified error of the call.
    pub async fn delete_webhook(&self) -> Result<(), ClientError> {
        self.call(&ApiRequest::post("deleteWebhook", serde_json::json!({}))).await?;
        Ok(())
    }

    /// `getWebhookInfo`.
    ///
    /// # Errors
    /// Returns the classified error of the call.
    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, ClientError> {
        self.call(&ApiRequest::get("getWebhookInfo")).await?.decode()
    }

    /// Start (or join) the polling session.
    pub async fn start_polling(&self, config: UpdateConfig) -> UpdateStream {
        self.polling.start(config).await
    }

    /// Stop polling and wait for the stream to close.
    pub async fn stop_polling(&self) {
        self.polling.stop().await;
    }

    /// Polling lifecycle state.
    pub async fn polling_status(&self) -> PollingStatus {
        self.polling.status().await
    }

    /// Whether polling is active.
    pub async fn is_polling(&self) -> bool {
        self.polling.is_polling().await
    }

    /// Last error observed by the polling loop.
    pub async fn last_polling_error(&self) -> Option<ClientError> {
        self.polling.last_error().await
    }

    /// Replace the webhook verification secret.
    pub async fn set_webhook_secret(&self, secret: impl Into<String>) {
        *self.webhook.write().await = WebhookVerifier::new(secret);
    }

    /// Verify a webhook body against the configured secret.
    ///
    /// # Errors
    /// Returns the specific [`SignatureError`].
    pub async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<(), SignatureError> {
        self.webhook.read().await.verify(payload, signature)
    }

    /// Verify and parse a webhook body.
    ///
    /// # Errors
    /// Returns [`WebhookError`] on signature or parse failure.
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<Update, WebhookError> {
        self.webhook.read().await.process(payload, signature)
    }

    /// Axum ingress bound to the current webhook secret.
    pub async fn webhook_app(&self, path: &str, tx: mpsc::Sender<Update>) -> WebhookApp {
        let verifier = self.webhook.read().await.clone();
        build_webhook_app(path, verifier, tx)
    }

    /// Stop polling and cancel every in-flight call.
    pub async fn close(&self) {
        self.polling.shutdown().await;
        self.shutdown.cancel();
        tracing::info!("Bot client closed");
    }
}

fn validate_webhook_url(raw: &str) -> Result<(), ClientError> {
    if raw.trim().is_empty() {
        return Err(ClientError::validation("webhook URL cannot be empty"));
    }
    let url = Url::parse(raw.trim())
        .map_err(|error| ClientError::validation(format!("invalid webhook URL: {error}")))?;
    if url.scheme() != "https" {
        return Err(ClientError::validation("webhook URL must use HTTPS"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ClientError::validation("webhook URL must have a host"));
    }
    Ok(())
}
