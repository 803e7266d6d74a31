//! Entry point when this binary is itself the `kecs-control-plane` pod
//! (`KECS_CONTAINER_MODE=true`, set by the Deployment the instance manager
//! creates): runs the ECS/ELBv2 API, the admin server, and the admission
//! webhook side by side until the pod is terminated.

use std::sync::Arc;

use anyhow::{Context, Result};
use kecs_api::AppContext;
use kube::Client;

const LOCALSTACK_DNS: &str = "kecs-localstack.kecs-system.svc";
const WEBHOOK_DNS: &str = "kecs-webhook.kecs-system.svc";
const WEBHOOK_SERVICE_PORT: u16 = 443;
const WEBHOOK_LISTEN_PORT: u16 = 8443;
const WIRE_PORT: u16 = 30080;

pub async fn run() -> Result<()> {
    let store_path = std::path::Path::new("/var/lib/kecs/data/store");
    tokio::fs::create_dir_all(store_path).await.context("creating store directory")?;
    let store = Arc::new(kecs_store::Store::open(store_path).context("opening store")?);

    let client = Client::try_default().await.context("building in-cluster kube client")?;

    let enabled_services: Vec<String> = std::env::var("KECS_ENABLED_SERVICES")
        .ok()
        .map(|v| v.split(',').map(str::to_string).collect())
        .unwrap_or_else(|| {
            kecs_instance::localstack::DEFAULT_ENABLED_SERVICES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

    let localstack_base_url = format!("http://{LOCALSTACK_DNS}:4566");
    let ctx = AppContext::new(store, Some(client.clone()), localstack_base_url, enabled_services);

    let admin_port: u16 = std::env::var("KECS_ADMIN_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(5374);

    let controller_store = ctx.store.clone();
    let controller_client = client.clone();

    tokio::try_join!(
        async { kecs_api::server::run(ctx, WIRE_PORT, admin_port).await.context("api server") },
        async { run_webhook(client).await.context("admission webhook") },
        async {
            kecs_controller::run(controller_client, controller_store).await;
            Ok(())
        },
    )?;

    Ok(())
}

async fn run_webhook(client: Client) -> Result<()> {
    let cert = kecs_webhook::cert::ensure(&client, WEBHOOK_DNS).await.context("ensuring webhook TLS cert")?;
    kecs_webhook::registration::ensure(&client, &cert.ca_bundle_base64, WEBHOOK_SERVICE_PORT as i32)
        .await
        .context("registering mutating webhook configuration")?;
    kecs_webhook::server::run(cert, WEBHOOK_LISTEN_PORT, LOCALSTACK_DNS.to_string())
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))
}
