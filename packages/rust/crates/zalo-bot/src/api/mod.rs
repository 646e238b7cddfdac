//! Bot API wire types and the retrying request executor.

mod envelope;
mod executor;
mod rate_limit;
mod request;

pub use envelope::ApiEnvelope;
pub use executor::{RequestExecutor, USER_AGENT};
pub use rate_limit::RateLimitInfo;
pub(crate) use rate_limit::parse_retry_after;
pub use request::{ApiRequest, ApiResponse};
