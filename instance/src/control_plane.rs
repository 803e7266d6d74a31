use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ServiceAccount, Service as K8sService};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use kube::Client;
use kube::api::Api;

use crate::error::{Error, Result};
use crate::k8s::{self, SYSTEM_NAMESPACE};

pub async fn deploy(client: Client, instance: &str, api_port: u16, admin_port: u16) -> Result<()> {
    k8s::ensure_namespace(client.clone(), SYSTEM_NAMESPACE).await?;

    let sa_api: Api<ServiceAccount> = Api::namespaced(client.clone(), SYSTEM_NAMESPACE);
    k8s::ensure(&sa_api, &k8s::control_plane_service_account()).await?;

    let role_api: Api<ClusterRole> = Api::all(client.clone());
    k8s::ensure(&role_api, &k8s::control_plane_cluster_role()).await?;

    let binding_api: Api<ClusterRoleBinding> = Api::all(client.clone());
    k8s::ensure(&binding_api, &k8s::control_plane_cluster_role_binding()).await?;

    let cm_api = Api::namespaced(client.clone(), SYSTEM_NAMESPACE);
    k8s::ensure(&cm_api, &k8s::control_plane_config_map(instance)).await?;

    let deployment_api: Api<Deployment> = Api::namespaced(client.clone(), SYSTEM_NAMESPACE);
    k8s::ensure(&deployment_api, &k8s::control_plane_deployment(admin_port)).await?;

    let svc_api: Api<K8sService> = Api::namespaced(client, SYSTEM_NAMESPACE);
    k8s::ensure(&svc_api, &k8s::control_plane_node_port_service(api_port)).await?;

    Ok(())
}

pub async fn wait_ready(client: Client, timeout: Duration) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(client, SYSTEM_NAMESPACE);
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(deployment) = api.get("kecs-control-plane").await
            && k8s::is_ready_deployment(&deployment)
        {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::Timeout(timeout, "control-plane deployment"));
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}
