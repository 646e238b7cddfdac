use serde::de::DeserializeOwned;

use crate::error::WebhookError;
use crate::types::{
    Message, MessageEvent, PostbackEvent, Update, UpdateKind, User, UserAction, UserActionEvent,
    UserActionType, WebhookEvent,
};

const EVENT_NAME_FIELD: &str = "event_name";

/// Decode a webhook body into an [`Update`].
///
/// A top-level `event_name` key marks a push-event envelope, which is
/// converted; any other object is decoded as a direct update envelope, where
/// `update_id` may legitimately be zero.
///
/// # Errors
/// Returns [`WebhookError`] for empty or malformed bodies, unknown event
/// names, and event data that does not match its event name.
pub fn parse_update(payload: &[u8]) -> Result<Update, WebhookError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(WebhookError::EmptyPayload);
    }
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    let is_push_event = value
        .as_object()
        .is_some_and(|object| object.contains_key(EVENT_NAME_FIELD));
    if is_push_event {
        let event: WebhookEvent = serde_json::from_value(value)?;
        return convert_event(event);
    }
    Ok(serde_json::from_value(value)?)
}

/// Convert a push event into the update shape produced by polling.
/// The event timestamp becomes the update id.
///
/// # Errors
/// Returns [`WebhookError::UnsupportedEvent`] for unknown event names and
/// [`WebhookError::InvalidUpdate`] when `data` does not decode.
pub fn convert_event(event: WebhookEvent) -> Result<Update, WebhookError> {
    let kind = match event.event_name.as_str() {
        "message" | "text_message" | "message_received" => {
            let data: MessageEvent = decode_data(&event, "message")?;
            let sender = if data.user_id.is_empty() {
                event.user_id.clone()
            } else {
                data.user_id
            };
            UpdateKind::Message(Message {
                message_id: data.message_id,
                from: Some(User {
                    id: sender,
                    ..User::default()
                }),
                date: data.timestamp.or(Some(event.timestamp)),
                text: data.text,
                attachments: data.attachments,
                ..Message::default()
            })
        }
        "postback" | "button_click" => {
            UpdateKind::Postback(decode_data::<PostbackEvent>(&event, "postback")?)
        }
        "user_action" | "user_join" | "user_leave" | "user_block" => {
            let data: UserActionEvent = decode_data(&event, "user action")?;
            let action_name = if data.action.is_empty() {
                event.event_name.trim_start_matches("user_")
            } else {
                data.action.as_str()
            };
            UpdateKind::UserAction(UserAction {
                action_type: UserActionType::from_name(action_name),
                user_id: if data.user_id.is_empty() {
                    event.user_id.clone()
                } else {
                    data.user_id.clone()
                },
                data: (!event.data.is_null()).then(|| event.data.clone()),
            })
        }
        other => return Err(WebhookError::UnsupportedEvent(other.to_string())),
    };
    Ok(Update {
        update_id: event.timestamp,
        kind,
    })
}

fn decode_data<T>(event: &WebhookEvent, label: &str) -> Result<T, WebhookError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(event.data.clone()).map_err(|error| {
        WebhookError::InvalidUpdate(format!("failed to parse {label} event: {error}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &serde_json::Value) -> Result<Update, WebhookError> {
        parse_update(value.to_string().as_bytes())
    }

    #[test]
    fn direct_update_with_zero_id_is_not_misread_as_event() -> Result<(), WebhookError> {
        let update = parse(&serde_json::json!({
            "update_id": 0,
            "message": {"message_id": "m0", "text": "first"}
        }))?;
        assert_eq!(update.update_id, 0);
        assert_eq!(update.message().map(|m| m.message_id.as_str()), Some("m0"));
        Ok(())
    }

    #[test]
    fn message_event_is_converted() -> Result<(), WebhookError> {
        let update = parse(&serde_json::json!({
            "event_name": "message",
            "app_id": "app",
            "user_id": "u-outer",
            "oa_id": "oa",
            "timestamp": 1_700_000_000_123_i64,
            "data": {"message_id": "m9", "text": "hello", "attachments": [{"type": "image", "url": "https://x/y.png"}]}
        }))?;
        assert_eq!(update.update_id, 1_700_000_000_123);
        let Some(message) = update.message() else {
            panic!("expected message update");
        };
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert_eq!(message.reply_chat_id(), Some("u-outer"));
        assert_eq!(message.attachments.len(), 1);
        Ok(())
    }

    #[test]
    fn user_action_name_falls_back_to_event_name() -> Result<(), WebhookError> {
        let update = parse(&serde_json::json!({
            "event_name": "user_leave",
            "timestamp": 5,
            "data": {"user_id": "u1"}
        }))?;
        let Some(action) = update.user_action() else {
            panic!("expected user action");
        };
        assert_eq!(action.action_type, UserActionType::Leave);
        assert_eq!(action.user_id, "u1");
        Ok(())
    }

    #[test]
    fn postback_event_is_converted() -> Result<(), WebhookError> {
        let update = parse(&serde_json::json!({
            "event_name": "button_click",
            "timestamp": 6,
            "data": {"payload": "YES", "title": "Yes"}
        }))?;
        assert_eq!(update.postback().map(|p| p.payload.as_str()), Some("YES"));
        Ok(())
    }

    #[test]
    fn bad_bodies_are_rejected() {
        assert!(matches!(parse_update(b"  "), Err(WebhookError::EmptyPayload)));
        assert!(matches!(parse_update(b"{"), Err(WebhookError::Malformed(_))));
        assert!(matches!(
            parse(&serde_json::json!({"event_name": "user_send_text", "timestamp": 1})),
            Err(WebhookError::UnsupportedEvent(name)) if name == "user_send_text"
        ));
        assert!(matches!(
            parse(&serde_json::json!({"event_name": "postback", "timestamp": 1, "data": {"title": 3}})),
            Err(WebhookError::InvalidUpdate(_))
        ));
    }
}
