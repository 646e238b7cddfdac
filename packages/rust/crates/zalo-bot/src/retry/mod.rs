//! Backoff policy and outcome classification for Bot API calls.

mod classify;
mod policy;

pub use classify::{classify_envelope, classify_response, classify_transport};
pub use policy::{MAX_RETRY_AFTER, RetryConfig};
