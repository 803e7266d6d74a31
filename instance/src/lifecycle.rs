use std::sync::Arc;
use std::time::Duration;

use kecs_common::progress::ProgressBus;
use kecs_store::Store;
use owo_colors::OwoColorize;

use crate::error::Result;
use crate::k3d::{self, PortMappings};
use crate::{control_plane, gateway, kubeconfig, localstack, recovery};

const READY_TIMEOUT: Duration = Duration::from_secs(120);

/// Brings up (or resumes) one instance's k3d cluster and everything that
/// runs inside it, reporting each step on `progress` so a CLI or API caller
/// can stream it.
pub async fn start(
    store: Arc<Store>,
    progress: &ProgressBus,
    instance: &str,
    ports: PortMappings,
    enabled_services: Vec<String>,
) -> Result<()> {
    let handle = progress.start(&format!("start:{instance}")).await;
    let result = run_start(&store, &handle, instance, ports, &enabled_services).await;
    match &result {
        Ok(()) => {
            println!("{}", format!("instance '{instance}' is ready").green());
            handle.finish_ok().await;
        }
        Err(e) => handle.finish_err(e.to_string()).await,
    }
    result
}

async fn run_start(
    store: &Arc<Store>,
    handle: &kecs_common::progress::ProgressHandle,
    instance: &str,
    ports: PortMappings,
    enabled_services: &[String],
) -> Result<()> {
    handle.emit("checking for existing cluster");
    if !k3d::cluster_exists(instance).await? {
        handle.emit("creating k3d cluster");
        k3d::create_cluster(instance, ports).await?;
    } else {
        handle.emit("starting existing k3d cluster");
        k3d::start_cluster(instance).await?;
    }

    let client = kubeconfig::client_for(instance).await?;

    handle.emit("deploying control plane");
    control_plane::deploy(client.clone(), instance, ports.api_port, ports.admin_port).await?;
    control_plane::wait_ready(client.clone(), READY_TIMEOUT).await?;

    handle.emit("deploying localstack");
    localstack::deploy(client.clone(), enabled_services).await?;

    handle.emit("deploying gateway");
    gateway::deploy(client.clone(), ports.gateway_port).await?;

    if std::env::var("KECS_AUTO_RECOVER_STATE").map(|v| v == "true").unwrap_or(true) {
        handle.emit("recovering prior state");
        let recovered = recovery::recover_all(store.clone()).await?;
        let failed = recovered.iter().filter(|r| r.outcome.is_err()).count();
        if failed > 0 {
            println!("{}", format!("{failed} cluster(s) failed to recover, see logs").yellow());
        }
    }
    Ok(())
}

pub async fn stop(progress: &ProgressBus, instance: &str) -> Result<()> {
    let handle = progress.start(&format!("stop:{instance}")).await;
    handle.emit("stopping k3d cluster");
    let result = k3d::stop_cluster(instance).await;
    match &result {
        Ok(()) => {
            println!("{}", format!("instance '{instance}' stopped").yellow());
            handle.finish_ok().await;
        }
        Err(e) => handle.finish_err(e.to_string()).await,
    }
    result
}

/// Gated on `KECS_KEEP_CLUSTERS_ON_SHUTDOWN`: when set, `destroy` only stops
/// the cluster instead of deleting it, preserving the hostPath data volume
/// for a later `start`.
pub async fn destroy(progress: &ProgressBus, instance: &str) -> Result<()> {
    let handle = progress.start(&format!("destroy:{instance}")).await;
    let result = if std::env::var("KECS_KEEP_CLUSTERS_ON_SHUTDOWN").map(|v| v == "true").unwrap_or(false) {
        handle.emit("keeping cluster per KECS_KEEP_CLUSTERS_ON_SHUTDOWN, stopping only");
        k3d::stop_cluster(instance).await
    } else {
        handle.emit("deleting k3d cluster");
        k3d::delete_cluster(instance).await
    };
    match &result {
        Ok(()) => {
            println!("{}", format!("instance '{instance}' destroyed").red());
            handle.finish_ok().await;
        }
        Err(e) => handle.finish_err(e.to_string()).await,
    }
    result
}
