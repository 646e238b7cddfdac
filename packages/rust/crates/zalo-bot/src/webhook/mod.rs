//! Inbound webhook handling: signature gate, payload parsing, HTTP ingress.

mod app;
mod parse;
mod service;
mod signature;

pub use app::{DEFAULT_WEBHOOK_PATH, WebhookApp, build_webhook_app};
pub use parse::{convert_event, parse_update};
pub use service::WebhookVerifier;
pub use signature::{ZALO_SIGNATURE_HEADER, sign_payload, verify_signature};
