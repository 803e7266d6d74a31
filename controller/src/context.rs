use std::sync::Arc;

use kube::Client;
use kecs_store::Store;

/// Shared between every reconciler invocation; one instance per controller run.
pub struct ReconcileContext {
    pub client: Client,
    pub store: Arc<Store>,
}

impl ReconcileContext {
    pub fn new(client: Client, store: Arc<Store>) -> Arc<Self> {
        Arc::new(ReconcileContext { client, store })
    }
}
