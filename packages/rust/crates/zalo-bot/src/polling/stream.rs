use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::types::Update;

/// Consumer handle of a polling session's bounded update queue.
///
/// Clones share one queue; every update is delivered to exactly one `recv`.
/// `recv` returns `None` once the session has stopped and the queue drained.
#[derive(Debug, Clone)]
pub struct UpdateStream {
    inner: Arc<Mutex<mpsc::Receiver<Update>>>,
}

impl UpdateStream {
    pub(super) fn new(rx: mpsc::Receiver<Update>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rx)),
        }
    }

    /// Next update in `update_id` order.
    pub async fn recv(&self) -> Option<Update> {
        self.inner.lock().await.recv().await
    }

    /// Whether both handles refer to the same session queue.
    #[must_use]
    pub fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
