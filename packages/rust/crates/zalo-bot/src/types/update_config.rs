use std::time::Duration;

use crate::api::ApiRequest;

/// Largest batch the Bot API returns per `getUpdates` call.
pub const MAX_UPDATES_LIMIT: u32 = 100;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Parameters of `getUpdates` and of the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Exclusive lower bound on update ids; 0 means "from the server's cursor".
    pub offset: i64,
    /// Batch size; 0 or anything above 100 is sent as 100.
    pub limit: u32,
    /// Seconds the server may hold the request open; 0 disables long polling.
    pub timeout_secs: u64,
    /// Pause between cycles when not long polling, and after a failed cycle.
    pub poll_interval: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_UPDATES_LIMIT,
            timeout_secs: 0,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl UpdateConfig {
    /// Long polling with the given hold time.
    #[must_use]
    pub fn long_poll(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            ..Self::default()
        }
    }

    /// Start after `offset`.
    #[must_use]
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Batch size.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Pause between short-poll cycles.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Limit clamped into `1..=100`.
    #[must_use]
    pub fn normalized_limit(&self) -> u32 {
        if self.limit == 0 {
            MAX_UPDATES_LIMIT
        } else {
            self.limit.min(MAX_UPDATES_LIMIT)
        }
    }

    /// Wait between cycles: the long-poll timeout when set, else `poll_interval`.
    #[must_use]
    pub fn cycle_interval(&self) -> Duration {
        if self.timeout_secs > 0 {
            Duration::from_secs(self.timeout_secs)
        } else {
            self.poll_interval
        }
    }

    /// `getUpdates` request starting at `offset`. Long polls get the hold time
    /// added to `base_timeout` so the HTTP timeout does not fire first.
    #[must_use]
    pub fn request(&self, offset: i64, base_timeout: Duration) -> ApiRequest {
        let mut request = ApiRequest::get("getUpdates");
        if offset > 0 {
            request = request.query("offset", offset);
        }
        request = request.query("limit", self.normalized_limit());
        if self.timeout_secs > 0 {
            request = request
                .query("timeout", self.timeout_secs)
                .timeout(base_timeout + Duration::from_secs(self.timeout_secs));
        }
        request
    }
}
