use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::api::RequestExecutor;
use crate::error::ClientError;
use crate::types::{Update, UpdateConfig};

use super::engine::PollingState;

/// Next offset after seeing `update_id`; never moves backwards.
pub(crate) fn advance_offset(offset: i64, update_id: i64) -> i64 {
    offset.max(update_id.saturating_add(1))
}

/// Position of a session: the next `getUpdates` offset and the lowest id
/// still allowed onto the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) offset: i64,
    floor: i64,
}

impl Cursor {
    pub(crate) fn new(offset: i64) -> Self {
        Self {
            offset,
            floor: offset,
        }
    }

    /// Equal ids pass so server-side duplicates are still delivered.
    pub(crate) fn admits(&self, update_id: i64) -> bool {
        update_id >= self.floor
    }

    pub(crate) fn published(&mut self, update_id: i64) {
        self.offset = advance_offset(self.offset, update_id);
        self.floor = self.floor.max(update_id);
    }

    pub(crate) fn skipped(&mut self, update_id: i64) {
        self.offset = advance_offset(self.offset, update_id);
    }
}

pub(super) struct PollWorker {
    pub(super) executor: Arc<RequestExecutor>,
    pub(super) base_timeout: Duration,
    pub(super) config: UpdateConfig,
    pub(super) cancel: CancellationToken,
    pub(super) tx: mpsc::Sender<Update>,
    pub(super) state: Arc<RwLock<PollingState>>,
}

impl PollWorker {
    pub(super) async fn run(self) {
        let mut cursor = Cursor::new(self.config.offset);
        let interval = self.config.cycle_interval();
        tracing::info!(
            offset = cursor.offset,
            limit = self.config.normalized_limit(),
            timeout_secs = self.config.timeout_secs,
            "Polling for updates"
        );

        while !self.cancel.is_cancelled() {
            let request = self.config.request(cursor.offset, self.base_timeout);
            let batch = match self
                .executor
                .execute(&request, &self.cancel)
                .await
                .and_then(|response| response.decode::<Option<Vec<serde_json::Value>>>())
            {
                Ok(batch) => batch.unwrap_or_default(),
                Err(error) => {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    tracing::warn!(
                        offset = cursor.offset,
                        retry_in_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "getUpdates failed; retrying next cycle"
                    );
                    self.record_error(error).await;
                    if !self.pause(interval).await {
                        break;
                    }
                    continue;
                }
            };

            let empty = batch.is_empty();
            if !self.publish(batch, &mut cursor).await {
                break;
            }
            if empty && self.config.timeout_secs == 0 && !self.pause(interval).await {
                break;
            }
        }
        tracing::debug!(offset = cursor.offset, "Polling loop exited");
    }

    /// Publish a batch in order, advancing `cursor` per update. Returns
    /// `false` when the session was cancelled or the stream was closed.
    async fn publish(&self, batch: Vec<serde_json::Value>, cursor: &mut Cursor) -> bool {
        for raw in batch {
            let raw_id = raw.get("update_id").and_then(serde_json::Value::as_i64);
            let update = match serde_json::from_value::<Update>(raw) {
                Ok(update) => update,
                Err(error) => {
                    tracing::warn!(update_id = ?raw_id, error = %error, "Skipping undecodable update");
                    if let Some(update_id) = raw_id {
                        cursor.skipped(update_id);
                    }
                    continue;
                }
            };
            let update_id = update.update_id;
            if !cursor.admits(update_id) {
                tracing::warn!(
                    update_id,
                    offset = cursor.offset,
                    "Dropping out-of-order update"
                );
                continue;
            }
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return false,
                sent = self.tx.send(update) => {
                    if sent.is_err() {
                        tracing::info!("Update stream closed; stopping polling");
                        return false;
                    }
                }
            }
            cursor.published(update_id);
        }
        true
    }

    async fn pause(&self, interval: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(interval) => true,
        }
    }

    async fn record_error(&self, error: ClientError) {
        self.state.write().await.last_error = Some(error);
    }
}
