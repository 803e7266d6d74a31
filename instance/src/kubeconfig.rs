use anyhow::Context;
use kube::Client;
use kube::config::{KubeConfigOptions, Kubeconfig};

use crate::error::Result;
use crate::paths;

/// Builds a client from the instance's own kubeconfig file, never the
/// ambient `~/.kube/config` — instances must stay isolated from each other
/// and from whatever cluster the host happens to be pointed at.
pub async fn client_for(instance: &str) -> Result<Client> {
    let path = paths::kubeconfig_path(instance);
    let kubeconfig = Kubeconfig::read_from(&path).context("reading instance kubeconfig")?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .context("building client config from kubeconfig")?;
    Ok(Client::try_from(config).context("constructing kube client")?)
}
