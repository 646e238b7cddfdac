//! Long-polling update delivery.

mod engine;
mod stream;
mod worker;

pub use engine::{PollingEngine, PollingStatus};
pub use stream::UpdateStream;
