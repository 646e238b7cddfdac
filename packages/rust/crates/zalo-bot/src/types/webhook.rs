use serde::{Deserialize, Serialize};

use super::Attachment;

/// Push-style event envelope delivered to webhooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event discriminant, e.g. `message` or `user_join`.
    pub event_name: String,
    /// Application id.
    #[serde(default)]
    pub app_id: String,
    /// User the event concerns.
    #[serde(default)]
    pub user_id: String,
    /// Official account id.
    #[serde(default)]
    pub oa_id: String,
    /// Event time; also used as the converted update id.
    #[serde(default)]
    pub timestamp: i64,
    /// Event-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `data` of a message push event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageEvent {
    /// Message id.
    #[serde(default)]
    pub message_id: String,
    /// Sender id.
    #[serde(default)]
    pub user_id: String,
    /// Text content.
    #[serde(default)]
    pub text: Option<String>,
    /// Attachments.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Event time.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// `data` of a user action push event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserActionEvent {
    /// Acting user.
    #[serde(default)]
    pub user_id: String,
    /// Action name (`join`, `leave`, `block`).
    #[serde(default)]
    pub action: String,
    /// Event time.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Result of `getWebhookInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookInfo {
    /// Registered URL; empty when no webhook is set.
    #[serde(default)]
    pub url: String,
    /// Whether a custom certificate was uploaded.
    #[serde(default)]
    pub has_custom_certificate: bool,
    /// Updates waiting for delivery.
    #[serde(default)]
    pub pending_update_count: u64,
    /// Unix time of the last delivery error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_date: Option<i64>,
    /// Last delivery error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
    /// Max simultaneous connections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    /// Update kinds delivered to the webhook.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<String>,
}
