use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

/// One step of a long-running instance-lifecycle operation (cluster create,
/// control-plane rollout, LocalStack rollout, ...), broadcast to any
/// subscriber (CLI progress bar, `/api/instances` poller) tracking it.
#[derive(Clone, Debug, Serialize)]
pub struct ProgressEvent {
    pub operation: String,
    pub step: String,
    pub done: bool,
    pub error: Option<String>,
}

struct Tracked {
    sender: broadcast::Sender<ProgressEvent>,
    cancel: CancellationToken,
}

struct ProgressBusInner {
    operations: Mutex<std::collections::HashMap<String, Tracked>>,
}

/// In-process registry of in-flight operations, keyed by an operation id
/// (`"start:<instance>"`, `"destroy:<instance>"`, ...). Callers cancel an
/// operation via its token; subscribers drop their receiver to stop
/// watching without affecting the operation itself.
#[derive(Clone)]
pub struct ProgressBus {
    inner: Arc<ProgressBusInner>,
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ProgressBusInner {
                operations: Mutex::new(std::collections::HashMap::new()),
            }),
        }
    }

    /// Registers a new tracked operation, returning a handle to publish
    /// events on and a cancellation token callers should honor.
    pub async fn start(&self, operation_id: &str) -> ProgressHandle {
        let (sender, _) = broadcast::channel(32);
        let cancel = CancellationToken::new();
        let mut ops = self.inner.operations.lock().await;
        ops.insert(
            operation_id.to_string(),
            Tracked {
                sender: sender.clone(),
                cancel: cancel.clone(),
            },
        );
        ProgressHandle {
            bus: self.clone(),
            operation_id: operation_id.to_string(),
            sender,
            cancel,
        }
    }

    pub async fn subscribe(&self, operation_id: &str) -> Option<broadcast::Receiver<ProgressEvent>> {
        let ops = self.inner.operations.lock().await;
        ops.get(operation_id).map(|t| t.sender.subscribe())
    }

    pub async fn cancel(&self, operation_id: &str) -> bool {
        let ops = self.inner.operations.lock().await;
        match ops.get(operation_id) {
            Some(t) => {
                t.cancel.cancel();
                true
            }
            None => false,
        }
    }

    async fn finish(&self, operation_id: &str) {
        self.inner.operations.lock().await.remove(operation_id);
    }
}

pub struct ProgressHandle {
    bus: ProgressBus,
    operation_id: String,
    sender: broadcast::Sender<ProgressEvent>,
    cancel: CancellationToken,
}

impl Deref for ProgressHandle {
    type Target = CancellationToken;
    fn deref(&self) -> &Self::Target {
        &self.cancel
    }
}

impl ProgressHandle {
    pub fn emit(&self, step: impl Into<String>) {
        let _ = self.sender.send(ProgressEvent {
            operation: self.operation_id.clone(),
            step: step.into(),
            done: false,
            error: None,
        });
    }

    pub async fn finish_ok(self) {
        let _ = self.sender.send(ProgressEvent {
            operation: self.operation_id.clone(),
            step: "done".to_string(),
            done: true,
            error: None,
        });
        self.bus.finish(&self.operation_id).await;
    }

    pub async fn finish_err(self, error: impl Into<String>) {
        let _ = self.sender.send(ProgressEvent {
            operation: self.operation_id.clone(),
            step: "failed".to_string(),
            done: true,
            error: Some(error.into()),
        });
        self.bus.finish(&self.operation_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_steps() {
        let bus = ProgressBus::new();
        let handle = bus.start("start:default").await;
        let mut rx = bus.subscribe("start:default").await.unwrap();
        handle.emit("creating cluster");
        let evt = rx.recv().await.unwrap();
        assert_eq!(evt.step, "creating cluster");
        assert!(!evt.done);
    }

    #[tokio::test]
    async fn finish_removes_operation_from_registry() {
        let bus = ProgressBus::new();
        let handle = bus.start("destroy:default").await;
        handle.finish_ok().await;
        assert!(bus.subscribe("destroy:default").await.is_none());
    }

    #[tokio::test]
    async fn cancel_trips_the_token_handed_to_the_operation() {
        let bus = ProgressBus::new();
        let handle = bus.start("start:default").await;
        assert!(!handle.is_cancelled());
        assert!(bus.cancel("start:default").await);
        assert!(handle.is_cancelled());
    }
}
