use k8s_openapi::api::core::v1::Pod;
use kecs_types::{Arn, Connectivity, KeyValuePair, Task, TaskStatus};
use kube::api::{Api, PostParams};
use kecs_translator::overrides::{ContainerOverride, RunTaskOverrides};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppContext;
use crate::ecs::{clusters, task_definitions};
use crate::error::{ApiError, ApiResult};

use super::wire::{Failure, KeyValuePairWire, TaskWire};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunTaskRequest {
    cluster: Option<String>,
    task_definition: String,
    #[serde(default)]
    count: Option<u32>,
    started_by: Option<String>,
    group: Option<String>,
    overrides: Option<TaskOverridesWire>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TaskOverridesWire {
    #[serde(default)]
    container_overrides: Vec<ContainerOverrideWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerOverrideWire {
    name: String,
    command: Option<Vec<String>>,
    #[serde(default)]
    environment: Vec<KeyValuePairWire>,
    cpu: Option<u32>,
    memory: Option<u32>,
}

fn to_overrides(wire: Option<TaskOverridesWire>) -> RunTaskOverrides {
    let wire = wire.unwrap_or_default();
    RunTaskOverrides {
        container_overrides: wire
            .container_overrides
            .into_iter()
            .map(|c| ContainerOverride {
                name: c.name,
                command: c.command,
                environment: if c.environment.is_empty() {
                    None
                } else {
                    Some(
                        c.environment
                            .into_iter()
                            .map(|e: KeyValuePairWire| KeyValuePair { name: e.name, value: e.value })
                            .collect(),
                    )
                },
                cpu: c.cpu,
                memory: c.memory,
            })
            .collect(),
    }
}

pub async fn run_task(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: RunTaskRequest = serde_json::from_value(body).map_err(invalid)?;
    let cluster = clusters::resolve_cluster(ctx, req.cluster.as_deref().unwrap_or("default"))?;
    let task_definition = task_definitions::resolve(ctx, &req.task_definition)?;
    let overrides = to_overrides(req.overrides);
    let count = req.count.unwrap_or(1).max(1).min(10);

    let mut tasks = Vec::new();
    for _ in 0..count {
        let task_id = Uuid::new_v4().simple().to_string();
        let arn = Arn::task(&ctx.region, &ctx.account_id, cluster.arn.short_name(), &task_id);
        let pod_name = kecs_translator::naming::pod_name(None, &task_id);
        let namespace = kecs_translator::naming::namespace(&cluster.name);
        let containers = task_definition
            .container_definitions
            .iter()
            .map(|c| kecs_types::ContainerRuntime {
                name: c.name.clone(),
                last_status: "PENDING".to_string(),
                health_status: kecs_types::HealthStatus::Unknown,
                exit_code: None,
                reason: None,
            })
            .collect();
        let task = Task {
            arn,
            cluster_arn: cluster.arn.clone(),
            task_definition_arn: task_definition.arn.clone(),
            service_arn: None,
            desired_status: TaskStatus::Running,
            last_status: TaskStatus::Provisioning,
            containers,
            cpu: task_definition.cpu.clone(),
            memory: task_definition.memory.clone(),
            started_by: req.started_by.clone(),
            group: req.group.clone(),
            started_at: None,
            stopped_at: None,
            stopped_reason: None,
            connectivity: Connectivity::Connected,
            pod_name: Some(pod_name),
            namespace: Some(namespace),
            version: 0,
        };
        let task = ctx.store.create_task(task)?;

        if let Some(client) = &ctx.kube_client {
            apply_pod(client, &task_definition, &cluster.name, &task_id, None, &overrides).await?;
        }
        tasks.push(TaskWire::from(&task));
    }

    Ok(serde_json::json!({"tasks": tasks, "failures": Vec::<Failure>::new()}))
}

async fn apply_pod(
    client: &kube::Client,
    task_definition: &kecs_types::TaskDefinition,
    cluster_name: &str,
    task_id: &str,
    service_name: Option<&str>,
    overrides: &RunTaskOverrides,
) -> ApiResult<()> {
    let pod = kecs_translator::build_pod(task_definition, cluster_name, task_id, service_name, overrides);
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();
    let api: Api<Pod> = Api::namespaced(client.clone(), &namespace);
    api.create(&PostParams::default(), &pod)
        .await
        .map(|_| ())
        .map_err(|e| ApiError::Server(e.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeTasksRequest {
    cluster: Option<String>,
    tasks: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
}

pub async fn describe_tasks(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: DescribeTasksRequest = serde_json::from_value(body).map_err(invalid)?;
    let want_tags = req.include.iter().any(|i| i == "TAGS");
    let mut tasks = Vec::new();
    let mut failures = Vec::new();
    for arn in &req.tasks {
        match ctx.store.get_task(arn) {
            Ok(t) => {
                let mut wire = TaskWire::from(&t);
                if want_tags {
                    let tags = ctx.store.list_tags(&t.arn.to_string())?;
                    wire = wire.with_tags(&tags);
                }
                tasks.push(wire);
            }
            Err(_) => failures.push(Failure { arn: arn.clone(), reason: "MISSING".to_string() }),
        }
    }
    let _ = req.cluster;
    Ok(serde_json::json!({"tasks": tasks, "failures": failures}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksRequest {
    cluster: Option<String>,
    service_name: Option<String>,
    max_results: Option<u32>,
    next_token: Option<String>,
}

pub async fn list_tasks(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: ListTasksRequest = serde_json::from_value(body).map_err(invalid)?;
    let cluster = clusters::resolve_cluster(ctx, req.cluster.as_deref().unwrap_or("default"))?;

    if let Some(service_name) = &req.service_name {
        let service = ctx
            .store
            .get_service_by_name(&cluster.arn.to_string(), service_name)
            .map_err(|_| ApiError::ServiceNotFound(format!("service {service_name} not found")))?;
        let tasks = ctx.store.list_tasks_by_service_status(&service.arn.to_string(), TaskStatus::Running)?;
        let arns: Vec<String> = tasks.iter().map(|t| t.arn.to_string()).collect();
        return Ok(serde_json::json!({"taskArns": arns, "nextToken": Value::Null}));
    }

    let (tasks, next_token) = ctx
        .store
        .list_tasks_by_cluster(&cluster.arn.to_string(), req.max_results, req.next_token.as_deref())?;
    let arns: Vec<String> = tasks.iter().map(|t| t.arn.to_string()).collect();
    Ok(serde_json::json!({"taskArns": arns, "nextToken": next_token}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopTaskRequest {
    cluster: Option<String>,
    task: String,
    reason: Option<String>,
}

pub async fn stop_task(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: StopTaskRequest = serde_json::from_value(body).map_err(invalid)?;
    let _ = req.cluster;
    let current = ctx
        .store
        .get_task(&req.task)
        .map_err(|_| ApiError::InvalidParameter(format!("task {} not found", req.task)))?;

    let stopped = ctx.store.stop_task(&current.arn.to_string(), current.version, req.reason)?;

    if let Some(client) = &ctx.kube_client
        && let (Some(namespace), Some(pod_name)) = (&stopped.namespace, &stopped.pod_name)
    {
        let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
        let _ = api.delete(pod_name, &Default::default()).await;
    }

    Ok(serde_json::json!({"task": TaskWire::from(&stopped)}))
}

fn invalid(e: serde_json::Error) -> ApiError {
    ApiError::InvalidParameter(e.to_string())
}
