use std::sync::Arc;

use kecs_store::Store;
use kube::Client;

/// Constructed once, at process start, by the `kecs` binary's `start`
/// command — never a global/singleton (the "no singletons" design rule).
/// Every handler receives it through axum's `State` extractor.
pub struct AppContext {
    pub store: Arc<Store>,
    /// `None` under `KECS_TEST_MODE`: operations still mutate the store but
    /// skip every Kubernetes call.
    pub kube_client: Option<Client>,
    pub region: String,
    pub account_id: String,
    pub localstack_base_url: String,
    pub enabled_services: Vec<String>,
    pub http: reqwest::Client,
}

impl AppContext {
    pub fn new(store: Arc<Store>, kube_client: Option<Client>, localstack_base_url: String, enabled_services: Vec<String>) -> Arc<Self> {
        Arc::new(AppContext {
            store,
            kube_client,
            region: "us-east-1".to_string(),
            account_id: "000000000000".to_string(),
            localstack_base_url,
            enabled_services,
            http: reqwest::Client::new(),
        })
    }

    pub fn test_mode(&self) -> bool {
        self.kube_client.is_none()
    }
}
