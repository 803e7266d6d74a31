use kecs_types::{
    Arn, ContainerDefinition, KeyValuePair, NetworkMode, TaskDefinition, TaskDefinitionStatus,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppContext;
use crate::error::{ApiError, ApiResult};

use super::wire::ContainerDefinitionWire;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterTaskDefinitionRequest {
    family: String,
    container_definitions: Vec<ContainerDefinitionWire>,
    #[serde(default)]
    volumes: Vec<Value>,
    network_mode: Option<String>,
    cpu: Option<String>,
    memory: Option<String>,
    task_role_arn: Option<String>,
    execution_role_arn: Option<String>,
}

fn parse_network_mode(s: Option<&str>) -> NetworkMode {
    match s {
        Some("host") | Some("HOST") => NetworkMode::Host,
        Some("awsvpc") | Some("AWSVPC") => NetworkMode::Awsvpc,
        Some("none") | Some("NONE") => NetworkMode::None,
        _ => NetworkMode::Bridge,
    }
}

pub async fn register_task_definition(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: RegisterTaskDefinitionRequest = serde_json::from_value(body).map_err(invalid)?;
    if req.container_definitions.is_empty() {
        return Err(ApiError::InvalidParameter("containerDefinitions must not be empty".to_string()));
    }

    let container_definitions = req
        .container_definitions
        .into_iter()
        .map(|c| ContainerDefinition {
            name: c.name,
            image: c.image,
            command: c.command,
            entry_point: c.entry_point,
            environment: c
                .environment
                .into_iter()
                .map(|e| KeyValuePair { name: e.name, value: e.value })
                .collect(),
            secrets: Vec::new(),
            port_mappings: c
                .port_mappings
                .into_iter()
                .map(|p| kecs_types::PortMapping {
                    container_port: p.container_port,
                    host_port: p.host_port,
                    protocol: p.protocol,
                    name: None,
                })
                .collect(),
            essential: c.essential,
            cpu: c.cpu,
            memory: c.memory,
            memory_reservation: None,
            log_configuration: None,
            health_check: None,
            depends_on: Vec::new(),
            mount_points: Vec::new(),
        })
        .collect();

    // revision (and the ARN's revision segment) are assigned by the store.
    let provisional_arn = Arn::task_definition(&ctx.region, &ctx.account_id, &req.family, 0);
    let task_definition = TaskDefinition {
        arn: provisional_arn,
        family: req.family,
        revision: 0,
        status: TaskDefinitionStatus::Active,
        container_definitions,
        volumes: Vec::new(),
        network_mode: parse_network_mode(req.network_mode.as_deref()),
        cpu: req.cpu,
        memory: req.memory,
        compatibilities: Vec::new(),
        proxy_configuration: None,
        task_role_arn: req.task_role_arn,
        execution_role_arn: req.execution_role_arn,
        registered_at: now(),
        deregistered_at: None,
    };
    let registered = ctx.store.register_task_definition(task_definition)?;
    Ok(serde_json::json!({"taskDefinition": to_wire(&registered)}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDefinitionIdRequest {
    task_definition: String,
}

pub async fn describe_task_definition(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: TaskDefinitionIdRequest = serde_json::from_value(body).map_err(invalid)?;
    let task_definition = resolve(ctx, &req.task_definition)?;
    Ok(serde_json::json!({"taskDefinition": to_wire(&task_definition)}))
}

pub async fn deregister_task_definition(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: TaskDefinitionIdRequest = serde_json::from_value(body).map_err(invalid)?;
    let task_definition = resolve(ctx, &req.task_definition)?;
    let deregistered = ctx.store.deregister_task_definition(&task_definition.arn.to_string())?;
    Ok(serde_json::json!({"taskDefinition": to_wire(&deregistered)}))
}

/// `taskDefinition` accepts a bare family (latest ACTIVE revision), a
/// `family:revision` pair, or a full ARN.
pub fn resolve(ctx: &AppContext, task_definition: &str) -> ApiResult<TaskDefinition> {
    let not_found = || ApiError::TaskDefinitionNotFound(format!("task definition {task_definition} not found"));
    if task_definition.starts_with("arn:") {
        return ctx.store.get_task_definition(task_definition).map_err(|_| not_found());
    }
    if let Some((family, revision)) = task_definition.rsplit_once(':')
        && let Ok(revision) = revision.parse::<u32>()
    {
        return ctx
            .store
            .get_task_definition_by_family_revision(family, revision)
            .map_err(|_| not_found());
    }
    ctx.store.latest_active_task_definition(task_definition).map_err(|_| not_found())
}

fn to_wire(t: &TaskDefinition) -> Value {
    serde_json::json!({
        "taskDefinitionArn": t.arn.to_string(),
        "family": t.family,
        "revision": t.revision,
        "status": match t.status { TaskDefinitionStatus::Active => "ACTIVE", TaskDefinitionStatus::Inactive => "INACTIVE" },
        "containerDefinitions": t.container_definitions.iter().map(container_to_wire).collect::<Vec<_>>(),
        "cpu": t.cpu,
        "memory": t.memory,
        "taskRoleArn": t.task_role_arn,
        "executionRoleArn": t.execution_role_arn,
    })
}

fn container_to_wire(c: &ContainerDefinition) -> Value {
    serde_json::json!({
        "name": c.name,
        "image": c.image,
        "command": c.command,
        "entryPoint": c.entry_point,
        "environment": c.environment.iter().map(|e| serde_json::json!({"name": e.name, "value": e.value})).collect::<Vec<_>>(),
        "essential": c.essential,
        "cpu": c.cpu,
        "memory": c.memory,
        "portMappings": c.port_mappings.iter().map(|p| serde_json::json!({
            "containerPort": p.container_port,
            "hostPort": p.host_port,
            "protocol": p.protocol,
        })).collect::<Vec<_>>(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTaskDefinitionsRequest {
    family_prefix: Option<String>,
    status: Option<String>,
    max_results: Option<u32>,
    next_token: Option<String>,
}

pub async fn list_task_definitions(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: ListTaskDefinitionsRequest = if body.is_null() {
        ListTaskDefinitionsRequest::default()
    } else {
        serde_json::from_value(body).map_err(invalid)?
    };
    let status = match req.status.as_deref() {
        Some("ACTIVE") => Some(TaskDefinitionStatus::Active),
        Some("INACTIVE") => Some(TaskDefinitionStatus::Inactive),
        _ => None,
    };
    let (arns, next_token) = ctx.store.list_task_definitions(
        req.family_prefix.as_deref(),
        status,
        req.max_results,
        req.next_token.as_deref(),
    )?;
    Ok(serde_json::json!({"taskDefinitionArns": arns, "nextToken": next_token}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTaskDefinitionFamiliesRequest {
    family_prefix: Option<String>,
    max_results: Option<u32>,
    next_token: Option<String>,
}

pub async fn list_task_definition_families(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: ListTaskDefinitionFamiliesRequest = if body.is_null() {
        ListTaskDefinitionFamiliesRequest::default()
    } else {
        serde_json::from_value(body).map_err(invalid)?
    };
    let (families, next_token) = ctx
        .store
        .list_task_definition_families(req.max_results, req.next_token.as_deref())?;
    let families = match req.family_prefix {
        Some(prefix) => families.into_iter().filter(|f| f.starts_with(&prefix)).collect(),
        None => families,
    };
    Ok(serde_json::json!({"families": families, "nextToken": next_token}))
}

fn invalid(e: serde_json::Error) -> ApiError {
    ApiError::InvalidParameter(e.to_string())
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
