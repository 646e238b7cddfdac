use serde::{Deserialize, Serialize};

/// Bot or end-user identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform user id.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether the account is a bot.
    #[serde(default)]
    pub is_bot: bool,
}

/// Profile returned by `getUserProfile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Platform user id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Conversation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// One-to-one chat.
    Private,
    /// Group chat.
    Group,
    /// Any kind this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// Conversation a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat id used as `chat_id` when replying.
    pub id: String,
    /// Chat kind.
    #[serde(rename = "type", default = "unknown_chat_type")]
    pub chat_type: ChatType,
}

fn unknown_chat_type() -> ChatType {
    ChatType::Unknown
}

/// Media kind of an [`Attachment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    /// Image.
    Image,
    /// Generic file.
    File,
    /// Video.
    Video,
    /// Audio.
    Audio,
    /// Any kind this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// Media attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Media kind.
    #[serde(rename = "type")]
    pub attachment_type: AttachmentType,
    /// Download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Platform file id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Inbound or sent message. Content shapes beyond text and attachments are
/// kept opaque in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub message_id: String,
    /// Sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// Conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<Chat>,
    /// Unix timestamp as sent by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attachments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Remaining fields (photo, sticker, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Chat id to reply to: the chat when present, otherwise the sender.
    #[must_use]
    pub fn reply_chat_id(&self) -> Option<&str> {
        self.chat
            .as_ref()
            .map(|chat| chat.id.as_str())
            .or_else(|| self.from.as_ref().map(|user| user.id.as_str()))
    }
}
