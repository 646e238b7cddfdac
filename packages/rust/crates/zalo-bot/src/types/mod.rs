//! Bot API data types.

mod message;
mod update;
mod update_config;
mod webhook;

pub use message::{Attachment, AttachmentType, Chat, ChatType, Message, User, UserProfile};
pub use update::{PostbackEvent, Update, UpdateKind, UserAction, UserActionType};
pub use update_config::{MAX_UPDATES_LIMIT, UpdateConfig};
pub use webhook::{MessageEvent, UserActionEvent, WebhookEvent, WebhookInfo};
