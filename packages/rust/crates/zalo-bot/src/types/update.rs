use serde::{Deserialize, Serialize};

use super::Message;

/// Button or postback interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostbackEvent {
    /// Payload attached to the pressed button.
    pub payload: String,
    /// Button title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

/// User lifecycle action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserActionType {
    /// User followed the bot.
    Join,
    /// User unfollowed the bot.
    Leave,
    /// User blocked the bot.
    Block,
    /// Any action this client does not know yet.
    #[serde(other)]
    Unknown,
}

impl UserActionType {
    /// Parse a bare action name (`join`, `leave`, `block`).
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "join" => Self::Join,
            "leave" => Self::Leave,
            "block" => Self::Block,
            _ => Self::Unknown,
        }
    }
}

/// User lifecycle action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    /// Action kind.
    #[serde(rename = "type")]
    pub action_type: UserActionType,
    /// Acting user.
    pub user_id: String,
    /// Action-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Payload carried by an [`Update`]. Exactly one variant per update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    /// Inbound message.
    Message(Message),
    /// Button or postback interaction.
    Postback(PostbackEvent),
    /// User lifecycle action.
    UserAction(UserAction),
    /// Envelope with no payload this client recognises.
    Unknown,
}

/// One unit of inbound activity.
///
/// On the wire this is the flat envelope
/// `{"update_id": .., "message" | "postback" | "user_action": ..}`; envelopes
/// carrying more than one payload field are rejected when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUpdate", into = "RawUpdate")]
pub struct Update {
    /// Monotonic id used as the polling offset.
    pub update_id: i64,
    /// Payload.
    pub kind: UpdateKind,
}

impl Update {
    /// Message payload, if this update carries one.
    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Postback payload, if this update carries one.
    #[must_use]
    pub fn postback(&self) -> Option<&PostbackEvent> {
        match &self.kind {
            UpdateKind::Postback(postback) => Some(postback),
            _ => None,
        }
    }

    /// User action payload, if this update carries one.
    #[must_use]
    pub fn user_action(&self) -> Option<&UserAction> {
        match &self.kind {
            UpdateKind::UserAction(action) => Some(action),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    postback: Option<PostbackEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_action: Option<UserAction>,
}

impl TryFrom<RawUpdate> for Update {
    type Error = String;

    fn try_from(raw: RawUpdate) -> Result<Self, Self::Error> {
        let kind = match (raw.message, raw.postback, raw.user_action) {
            (Some(message), None, None) => UpdateKind::Message(message),
            (None, Some(postback), None) => UpdateKind::Postback(postback),
            (None, None, Some(action)) => UpdateKind::UserAction(action),
            (None, None, None) => UpdateKind::Unknown,
            _ => {
                return Err(format!(
                    "update {} carries more than one payload",
                    raw.update_id
                ));
            }
        };
        Ok(Self {
            update_id: raw.update_id,
            kind,
        })
    }
}

impl From<Update> for RawUpdate {
    fn from(update: Update) -> Self {
        let mut raw = Self {
            update_id: update.update_id,
            message: None,
            postback: None,
            user_action: None,
        };
        match update.kind {
            UpdateKind::Message(message) => raw.message = Some(message),
            UpdateKind::Postback(postback) => raw.postback = Some(postback),
            UpdateKind::UserAction(action) => raw.user_action = Some(action),
            UpdateKind::Unknown => {}
        }
        raw
    }
}
