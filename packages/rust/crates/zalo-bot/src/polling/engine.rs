use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::api::RequestExecutor;
use crate::error::ClientError;
use crate::types::UpdateConfig;

use super::stream::UpdateStream;
use super::worker::PollWorker;

/// Lifecycle of a [`PollingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingStatus {
    /// No session.
    Idle,
    /// A loop is running.
    Polling,
    /// Cancellation requested; the loop has not finished teardown yet.
    Stopping,
}

struct Session {
    generation: u64,
    stream: UpdateStream,
    cancel: CancellationToken,
    finished: CancellationToken,
    stopping: bool,
}

#[derive(Default)]
pub(super) struct PollingState {
    session: Option<Session>,
    generation: u64,
    pub(super) last_error: Option<ClientError>,
}

/// Owns at most one background `getUpdates` loop and its update stream.
///
/// `start`/`stop` transitions take the write lock; status queries take the read
/// lock. The stream is closed only by the loop side, after which the session is
/// cleared and waiters of `stop` are released.
pub struct PollingEngine {
    executor: Arc<RequestExecutor>,
    base_timeout: Duration,
    queue_capacity: usize,
    root: CancellationToken,
    state: Arc<RwLock<PollingState>>,
}

impl PollingEngine {
    /// Engine whose sessions are children of `root`; cancelling `root` ends
    /// any running session.
    #[must_use]
    pub fn new(
        executor: Arc<RequestExecutor>,
        base_timeout: Duration,
        queue_capacity: usize,
        root: CancellationToken,
    ) -> Self {
        Self {
            executor,
            base_timeout,
            queue_capacity: queue_capacity.max(1),
            root,
            state: Arc::new(RwLock::new(PollingState::default())),
        }
    }

    /// Start polling, or join the running session.
    ///
    /// While polling, returns the existing stream and ignores `config`. While a
    /// previous session is still tearing down, waits for it and then starts
    /// fresh.
    pub async fn start(&self, config: UpdateConfig) -> UpdateStream {
        loop {
            let previous = {
                let mut state = self.state.write().await;
                let Some(session) = state.session.as_ref() else {
                    return self.spawn_session(&mut state, config);
                };
                if !session.stopping {
                    return session.stream.clone();
                }
                session.finished.clone()
            };
            previous.cancelled().await;
        }
    }

    fn spawn_session(&self, state: &mut PollingState, config: UpdateConfig) -> UpdateStream {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let stream = UpdateStream::new(rx);
        let cancel = self.root.child_token();
        let finished = CancellationToken::new();
        state.generation += 1;
        let generation = state.generation;
        state.last_error = None;
        state.session = Some(Session {
            generation,
            stream: stream.clone(),
            cancel: cancel.clone(),
            finished: finished.clone(),
            stopping: false,
        });

        let worker = PollWorker {
            executor: Arc::clone(&self.executor),
            base_timeout: self.base_timeout,
            config,
            cancel,
            tx,
            state: Arc::clone(&self.state),
        };
        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            // The worker owns the only sender; its exit closes the stream even on panic.
            if let Err(error) = tokio::spawn(worker.run()).await {
                tracing::error!(generation, error = %error, "Polling loop aborted");
            }
            {
                let mut state = shared.write().await;
                if state
                    .session
                    .as_ref()
                    .is_some_and(|session| session.generation == generation)
                {
                    state.session = None;
                }
            }
            finished.cancel();
            tracing::info!(generation, "Polling stopped");
        });
        tracing::info!(generation, "Polling started");
        stream
    }

    /// Cancel the running session and wait until its stream is closed.
    /// A no-op when idle; concurrent callers all wait for the same teardown.
    pub async fn stop(&self) {
        let finished = {
            let mut state = self.state.write().await;
            let Some(session) = state.session.as_mut() else {
                return;
            };
            if !session.stopping {
                session.stopping = true;
                session.cancel.cancel();
                tracing::info!(generation = session.generation, "Stopping polling");
            }
            session.finished.clone()
        };
        finished.cancelled().await;
    }

    /// Cancel the engine's root token and wait for the session to end.
    /// Sessions started afterwards end immediately.
    pub async fn shutdown(&self) {
        self.root.cancel();
        self.stop().await;
    }

    /// Current lifecycle state.
    pub async fn status(&self) -> PollingStatus {
        match &self.state.read().await.session {
            None => PollingStatus::Idle,
            Some(session) if session.stopping || session.cancel.is_cancelled() => {
                PollingStatus::Stopping
            }
            Some(_) => PollingStatus::Polling,
        }
    }

    /// Whether a loop is running and not stopping.
    pub async fn is_polling(&self) -> bool {
        self.status().await == PollingStatus::Polling
    }

    /// Last per-cycle error of the current or most recent session.
    pub async fn last_error(&self) -> Option<ClientError> {
        self.state.read().await.last_error.clone()
    }
}

impl Drop for PollingEngine {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
