//! ECS JSON-1.1 operation handlers, dispatched by the `X-Amz-Target` suffix
//! after `AmazonEC2ContainerServiceV20141113.`.

pub mod clusters;
pub mod services;
pub mod task_definitions;
pub mod tasks;
pub mod wire;

use serde_json::Value;

use crate::app::AppContext;
use crate::error::{ApiError, ApiResult};

pub async fn dispatch(ctx: &AppContext, operation: &str, body: Value) -> ApiResult<Value> {
    match operation {
        "CreateCluster" => clusters::create_cluster(ctx, body).await,
        "DeleteCluster" => clusters::delete_cluster(ctx, body).await,
        "ListClusters" => clusters::list_clusters(ctx, body).await,
        "DescribeClusters" => clusters::describe_clusters(ctx, body).await,

        "RegisterTaskDefinition" => task_definitions::register_task_definition(ctx, body).await,
        "DescribeTaskDefinition" => task_definitions::describe_task_definition(ctx, body).await,
        "DeregisterTaskDefinition" => task_definitions::deregister_task_definition(ctx, body).await,
        "ListTaskDefinitions" => task_definitions::list_task_definitions(ctx, body).await,
        "ListTaskDefinitionFamilies" => task_definitions::list_task_definition_families(ctx, body).await,

        "CreateService" => services::create_service(ctx, body).await,
        "DescribeServices" => services::describe_services(ctx, body).await,
        "ListServices" => services::list_services(ctx, body).await,
        "UpdateService" => services::update_service(ctx, body).await,
        "DeleteService" => services::delete_service(ctx, body).await,

        "RunTask" => tasks::run_task(ctx, body).await,
        "DescribeTasks" => tasks::describe_tasks(ctx, body).await,
        "ListTasks" => tasks::list_tasks(ctx, body).await,
        "StopTask" => tasks::stop_task(ctx, body).await,

        other => Err(ApiError::UnknownOperation(other.to_string())),
    }
}
