use kecs_types::{
    Arn, DeploymentConfiguration, LaunchType, NetworkConfiguration, SchedulingStrategy, Service,
    ServiceStatus,
};
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::ecs::{clusters, task_definitions};

use super::wire::{Failure, ServiceWire};

fn parse_launch_type(s: Option<&str>) -> LaunchType {
    match s {
        Some("FARGATE") => LaunchType::Fargate,
        Some("EXTERNAL") => LaunchType::External,
        _ => LaunchType::Ec2,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateServiceRequest {
    cluster: String,
    service_name: String,
    task_definition: String,
    #[serde(default)]
    desired_count: u32,
    launch_type: Option<String>,
    #[serde(default)]
    scheduling_strategy: Option<String>,
}

pub async fn create_service(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: CreateServiceRequest = serde_json::from_value(body).map_err(invalid)?;
    let cluster = clusters::resolve_cluster(ctx, &req.cluster)?;
    let task_definition = task_definitions::resolve(ctx, &req.task_definition)?;

    let arn = Arn::service(&ctx.region, &ctx.account_id, &cluster.name, &req.service_name);
    let service = Service {
        arn,
        name: req.service_name,
        cluster_arn: cluster.arn.clone(),
        task_definition_arn: task_definition.arn.clone(),
        desired_count: req.desired_count,
        running_count: 0,
        pending_count: 0,
        launch_type: parse_launch_type(req.launch_type.as_deref()),
        deployment_config: DeploymentConfiguration::default(),
        network_config: NetworkConfiguration::default(),
        load_balancers: Vec::new(),
        events: Vec::new(),
        scheduling_strategy: match req.scheduling_strategy.as_deref() {
            Some("DAEMON") => SchedulingStrategy::Daemon,
            _ => SchedulingStrategy::Replica,
        },
        deployment_controller: kecs_types::DeploymentControllerType::Ecs,
        status: ServiceStatus::Active,
        version: 0,
    };
    let service = ctx.store.create_service(service)?;

    if let Some(client) = &ctx.kube_client {
        apply_deployment(client, &service, &task_definition, &cluster.name).await?;
    }

    Ok(serde_json::json!({"service": ServiceWire::from(&service)}))
}

async fn apply_deployment(client: &kube::Client, service: &Service, task_definition: &kecs_types::TaskDefinition, cluster_name: &str) -> ApiResult<()> {
    let deployment = kecs_translator::build_deployment(service, task_definition, cluster_name);
    let namespace = deployment.metadata.namespace.clone().unwrap_or_default();
    let api: Api<Deployment> = Api::namespaced(client.clone(), &namespace);
    let name = deployment.metadata.name.clone().unwrap_or_default();
    match api.create(&PostParams::default(), &deployment).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            api.replace(&name, &PostParams::default(), &deployment)
                .await
                .map(|_| ())
                .map_err(|e| ApiError::Server(e.to_string()))
        }
        Err(e) => Err(ApiError::Server(e.to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeServicesRequest {
    cluster: String,
    services: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
}

pub async fn describe_services(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: DescribeServicesRequest = serde_json::from_value(body).map_err(invalid)?;
    let cluster = clusters::resolve_cluster(ctx, &req.cluster)?;
    let want_tags = req.include.iter().any(|i| i == "TAGS");
    let mut services = Vec::new();
    let mut failures = Vec::new();
    for name in &req.services {
        match resolve(ctx, &cluster.arn.to_string(), name) {
            Ok(s) => {
                let mut wire = ServiceWire::from(&s);
                if want_tags {
                    let tags = ctx.store.list_tags(&s.arn.to_string())?;
                    wire = wire.with_tags(&tags);
                }
                services.push(wire);
            }
            Err(_) => failures.push(Failure { arn: name.clone(), reason: "MISSING".to_string() }),
        }
    }
    Ok(serde_json::json!({"services": services, "failures": failures}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateServiceRequest {
    cluster: String,
    service: String,
    desired_count: Option<u32>,
    task_definition: Option<String>,
}

pub async fn update_service(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: UpdateServiceRequest = serde_json::from_value(body).map_err(invalid)?;
    let cluster = clusters::resolve_cluster(ctx, &req.cluster)?;
    let current = resolve(ctx, &cluster.arn.to_string(), &req.service)?;
    if !matches!(current.status, ServiceStatus::Active) {
        return Err(ApiError::ServiceNotActive);
    }
    let new_task_definition_arn = match &req.task_definition {
        Some(td) => Some(task_definitions::resolve(ctx, td)?.arn),
        None => None,
    };

    let updated = ctx.store.update_service_cas(&current.arn.to_string(), current.version, |s| {
        if let Some(dc) = req.desired_count {
            s.desired_count = dc;
        }
        if let Some(arn) = &new_task_definition_arn {
            s.task_definition_arn = arn.clone();
        }
    })?;

    if let Some(client) = &ctx.kube_client {
        let task_definition = task_definitions::resolve(ctx, &updated.task_definition_arn.to_string())?;
        apply_deployment(client, &updated, &task_definition, &cluster.name).await?;
    }

    Ok(serde_json::json!({"service": ServiceWire::from(&updated)}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteServiceRequest {
    cluster: String,
    service: String,
    #[serde(default)]
    force: bool,
}

pub async fn delete_service(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: DeleteServiceRequest = serde_json::from_value(body).map_err(invalid)?;
    let cluster = clusters::resolve_cluster(ctx, &req.cluster)?;
    let current = resolve(ctx, &cluster.arn.to_string(), &req.service)?;
    if current.running_count > 0 && !req.force {
        return Err(ApiError::InvalidParameter(
            "service has running tasks; pass force=true or scale to zero first".to_string(),
        ));
    }
    let updated = ctx.store.update_service_cas(&current.arn.to_string(), current.version, |s| {
        s.status = ServiceStatus::Inactive;
        s.desired_count = 0;
    })?;
    Ok(serde_json::json!({"service": ServiceWire::from(&updated)}))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListServicesRequest {
    cluster: Option<String>,
    max_results: Option<u32>,
    next_token: Option<String>,
}

pub async fn list_services(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: ListServicesRequest = if body.is_null() {
        ListServicesRequest::default()
    } else {
        serde_json::from_value(body).map_err(invalid)?
    };
    let cluster = clusters::resolve_cluster(ctx, req.cluster.as_deref().unwrap_or("default"))?;
    let (services, next_token) = ctx
        .store
        .list_services(&cluster.arn.to_string(), req.max_results, req.next_token.as_deref())?;
    let arns: Vec<String> = services.iter().map(|s| s.arn.to_string()).collect();
    Ok(serde_json::json!({"serviceArns": arns, "nextToken": next_token}))
}

fn resolve(ctx: &AppContext, cluster_arn: &str, service: &str) -> ApiResult<Service> {
    let not_found = || ApiError::ServiceNotFound(format!("service {service} not found"));
    if service.starts_with("arn:") {
        ctx.store.get_service(service).map_err(|_| not_found())
    } else {
        ctx.store.get_service_by_name(cluster_arn, service).map_err(|_| not_found())
    }
}

fn invalid(e: serde_json::Error) -> ApiError {
    ApiError::InvalidParameter(e.to_string())
}
