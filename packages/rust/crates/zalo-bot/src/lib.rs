//! Zalo Bot API client.
//!
//! - **Polling**: [`PollingEngine`] turns `getUpdates` into an ordered [`UpdateStream`]
//!   with offset tracking and awaitable shutdown.
//! - **Requests**: [`RequestExecutor`] embeds the token in the path, parses the response
//!   envelope and retries per [`RetryConfig`].
//! - **Webhooks**: [`WebhookVerifier`] checks `X-Zalo-Signature` and yields the same
//!   [`Update`] the poller emits; [`build_webhook_app`] serves it over axum.

pub mod api;
mod client;
pub mod config;
pub mod error;
pub mod polling;
pub mod retry;
pub mod types;
pub mod webhook;

pub use api::{ApiEnvelope, ApiRequest, ApiResponse, RateLimitInfo, RequestExecutor};
pub use client::ZaloBot;
pub use config::{BotConfig, DEFAULT_API_BASE_URL, Environment, validate_bot_token};
pub use error::{ClientError, ErrorKind, SignatureError, WebhookError};
pub use polling::{PollingEngine, PollingStatus, UpdateStream};
pub use retry::RetryConfig;
pub use types::{
    Attachment, AttachmentType, Chat, ChatType, Message, PostbackEvent, Update, UpdateConfig,
    UpdateKind, User, UserAction, UserActionType, UserProfile, WebhookEvent, WebhookInfo,
};
pub use webhook::{
    WebhookApp, WebhookVerifier, ZALO_SIGNATURE_HEADER, build_webhook_app, parse_update,
    sign_payload, verify_signature,
};
