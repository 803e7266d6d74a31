use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kecs_types::{Arn, Cluster};
use kube::api::{Api, PostParams};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppContext;
use crate::error::{ApiError, ApiResult};

use super::wire::ClusterWire;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateClusterRequest {
    cluster_name: String,
}

pub async fn create_cluster(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: CreateClusterRequest = serde_json::from_value(body).map_err(invalid)?;
    let arn = Arn::cluster(&ctx.region, &ctx.account_id, &req.cluster_name);
    let k8s_name = format!("kecs-{}", req.cluster_name);
    let mut cluster = Cluster::new(arn, req.cluster_name, k8s_name, now());
    cluster.status = kecs_types::ClusterStatus::Active;
    let cluster = ctx.store.create_cluster(cluster)?;

    if let Some(client) = &ctx.kube_client {
        ensure_namespace(client, &cluster.namespace()).await?;
    }

    Ok(serde_json::json!({"cluster": ClusterWire::from(&cluster)}))
}

async fn ensure_namespace(client: &kube::Client, name: &str) -> ApiResult<()> {
    let api: Api<Namespace> = Api::all(client.clone());
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    match api.create(&PostParams::default(), &ns).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(ApiError::Server(e.to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteClusterRequest {
    cluster: String,
}

pub async fn delete_cluster(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: DeleteClusterRequest = serde_json::from_value(body).map_err(invalid)?;
    let cluster = resolve_cluster(ctx, &req.cluster)?;

    if any_active_service(ctx, &cluster.arn.to_string())? {
        return Err(ApiError::ClusterContainsServices);
    }
    if any_non_stopped_task(ctx, &cluster.arn.to_string())? {
        return Err(ApiError::ClusterContainsTasks);
    }

    ctx.store.delete_cluster(&cluster.arn.to_string(), &cluster.name)?;
    Ok(serde_json::json!({"cluster": ClusterWire::from(&cluster)}))
}

/// Invariant (f) requires scanning every page, not just the first: a
/// cluster with 150 tasks where only the 101st is still running must still
/// block deletion.
fn any_active_service(ctx: &AppContext, cluster_arn: &str) -> ApiResult<bool> {
    let mut next_token = None;
    loop {
        let (services, token) = ctx.store.list_services(cluster_arn, Some(100), next_token.as_deref())?;
        if services.iter().any(|s| matches!(s.status, kecs_types::ServiceStatus::Active)) {
            return Ok(true);
        }
        next_token = token;
        if next_token.is_none() {
            return Ok(false);
        }
    }
}

fn any_non_stopped_task(ctx: &AppContext, cluster_arn: &str) -> ApiResult<bool> {
    let mut next_token = None;
    loop {
        let (tasks, token) = ctx.store.list_tasks_by_cluster(cluster_arn, Some(100), next_token.as_deref())?;
        if tasks.iter().any(|t| t.last_status != kecs_types::TaskStatus::Stopped) {
            return Ok(true);
        }
        next_token = token;
        if next_token.is_none() {
            return Ok(false);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListClustersRequest {
    max_results: Option<u32>,
    next_token: Option<String>,
}

pub async fn list_clusters(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: ListClustersRequest = if body.is_null() {
        ListClustersRequest::default()
    } else {
        serde_json::from_value(body).map_err(invalid)?
    };
    let (clusters, next_token) = ctx.store.list_clusters(req.max_results, req.next_token.as_deref())?;
    let arns: Vec<String> = clusters.iter().map(|c| c.arn.to_string()).collect();
    Ok(serde_json::json!({"clusterArns": arns, "nextToken": next_token}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeClustersRequest {
    #[serde(default)]
    clusters: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
}

pub async fn describe_clusters(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: DescribeClustersRequest = serde_json::from_value(body).map_err(invalid)?;
    let want_tags = req.include.iter().any(|i| i == "TAGS");
    let want_settings = req.include.iter().any(|i| i == "SETTINGS");
    let mut clusters = Vec::new();
    let mut failures = Vec::new();
    for name in &req.clusters {
        match resolve_cluster(ctx, name) {
            Ok(c) => {
                let mut wire = ClusterWire::from(&c);
                if want_settings {
                    wire = wire.with_settings(&c);
                }
                if want_tags {
                    let tags = ctx.store.list_tags(&c.arn.to_string())?;
                    wire = wire.with_tags(&tags);
                }
                clusters.push(wire);
            }
            Err(_) => failures.push(super::wire::Failure {
                arn: name.clone(),
                reason: "MISSING".to_string(),
            }),
        }
    }
    Ok(serde_json::json!({"clusters": clusters, "failures": failures}))
}

/// `cluster` may be a full ARN or a bare name, as ECS allows for every
/// operation that takes a cluster identifier.
pub fn resolve_cluster(ctx: &AppContext, cluster: &str) -> ApiResult<Cluster> {
    if cluster.starts_with("arn:") {
        ctx.store
            .get_cluster(cluster)
            .map_err(|_| ApiError::ClusterNotFound(format!("cluster {cluster} not found")))
    } else {
        ctx.store
            .get_cluster_by_name(cluster)
            .map_err(|_| ApiError::ClusterNotFound(format!("cluster {cluster} not found")))
    }
}

fn invalid(e: serde_json::Error) -> ApiError {
    ApiError::InvalidParameter(e.to_string())
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
