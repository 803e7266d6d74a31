use std::sync::Arc;

use k8s_openapi::api::apps::v1::Deployment;
use kecs_store::Store;
use kecs_types::{ClusterStatus, LocalStackState};
use kube::Client;
use kube::api::{Api, PostParams};
use owo_colors::OwoColorize;

use crate::error::Result;
use crate::{k3d, k8s, localstack};

/// Outcome of recovering a single cluster, for the caller's startup summary.
pub struct ClusterRecovery {
    pub cluster_name: String,
    pub outcome: std::result::Result<(), String>,
}

/// Walks every cluster row and brings its backing k3d cluster back in line
/// with the store, gated on `KECS_AUTO_RECOVER_STATE`. A failure on one
/// cluster is logged and counted, never fatal to the others or to startup.
pub async fn recover_all(store: Arc<Store>) -> Result<Vec<ClusterRecovery>> {
    let mut results = Vec::new();
    let mut next_token = None;
    loop {
        let (clusters, token) = store.list_clusters(Some(100), next_token.as_deref())?;
        for cluster in clusters {
            if cluster.k8s_cluster_name.is_empty() {
                continue;
            }
            let outcome = recover_cluster(&store, &cluster.k8s_cluster_name, &cluster.arn.to_string()).await;
            if let Err(e) = &outcome {
                tracing::warn!(cluster = %cluster.name, error = %e, "cluster recovery failed");
            }
            results.push(ClusterRecovery {
                cluster_name: cluster.name.clone(),
                outcome: outcome.map_err(|e| e.to_string()),
            });
        }
        next_token = token;
        if next_token.is_none() {
            break;
        }
    }
    println!(
        "{}",
        format!("recovered {}/{} clusters", results.iter().filter(|r| r.outcome.is_ok()).count(), results.len()).cyan()
    );
    Ok(results)
}

async fn recover_cluster(store: &Store, instance: &str, cluster_arn: &str) -> Result<()> {
    if !k3d::cluster_exists(instance).await? {
        store.update_cluster_cas(cluster_arn, store.get_cluster(cluster_arn)?.version, |c| {
            c.status = ClusterStatus::Inactive;
        })?;
        return Ok(());
    }

    let client = crate::kubeconfig::client_for(instance).await?;
    k8s::ensure_namespace(client.clone(), k8s::SYSTEM_NAMESPACE).await?;

    let cluster = store.get_cluster(cluster_arn)?;
    if matches!(cluster.local_stack_state, LocalStackState::Deployed) {
        let enabled: Vec<String> = localstack::DEFAULT_ENABLED_SERVICES.iter().map(|s| s.to_string()).collect();
        localstack::deploy(client.clone(), &enabled).await?;
    }

    redeploy_services(&client, store, cluster_arn).await
}

async fn redeploy_services(client: &Client, store: &Store, cluster_arn: &str) -> Result<()> {
    let cluster = store.get_cluster(cluster_arn)?;
    let mut next_token = None;
    loop {
        let (services, token) = store.list_services(cluster_arn, Some(100), next_token.as_deref())?;
        for service in services {
            if service.desired_count == 0 {
                continue;
            }
            let task_definition = store.get_task_definition(&service.task_definition_arn.to_string())?;
            let deployment = kecs_translator::build_deployment(&service, &task_definition, &cluster.name);
            let namespace = deployment.metadata.namespace.clone().unwrap_or_else(|| k8s::SYSTEM_NAMESPACE.to_string());
            let api: Api<Deployment> = Api::namespaced(client.clone(), &namespace);
            match api.create(&PostParams::default(), &deployment).await {
                Ok(_) => {}
                Err(kube::Error::Api(ae)) if ae.code == 409 => {
                    let name = deployment.metadata.name.clone().unwrap_or_default();
                    api.replace(&name, &PostParams::default(), &deployment).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        next_token = token;
        if next_token.is_none() {
            break;
        }
    }
    Ok(())
}
