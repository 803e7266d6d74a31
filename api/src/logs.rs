//! `GetTaskLogs`, reachable either as `POST /v1/GetTaskLogs` or via
//! `X-Amz-Target: AWSie.GetTaskLogs`. Tails a task's pod directly through the
//! Kubernetes API rather than through LocalStack's Logs emulation, since the
//! log bytes only ever exist on the pod.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, LogParams};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppContext;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTaskLogsRequest {
    task: String,
    #[serde(default)]
    tail_lines: Option<i64>,
}

pub async fn get_task_logs(ctx: &AppContext, body: Value) -> ApiResult<Value> {
    let req: GetTaskLogsRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::InvalidParameter(e.to_string()))?;
    let task = ctx
        .store
        .get_task(&req.task)
        .map_err(|_| ApiError::InvalidParameter(format!("task {} not found", req.task)))?;

    let Some(client) = &ctx.kube_client else {
        return Ok(serde_json::json!({"taskArn": task.arn.to_string(), "logLines": Vec::<String>::new()}));
    };
    let (namespace, pod_name) = match (&task.namespace, &task.pod_name) {
        (Some(ns), Some(name)) => (ns.clone(), name.clone()),
        _ => return Ok(serde_json::json!({"taskArn": task.arn.to_string(), "logLines": Vec::<String>::new()})),
    };

    let api: Api<Pod> = Api::namespaced(client.clone(), &namespace);
    let params = LogParams {
        tail_lines: req.tail_lines.or(Some(500)),
        timestamps: true,
        ..Default::default()
    };
    let raw = api
        .logs(&pod_name, &params)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;
    let log_lines: Vec<&str> = raw.lines().collect();

    Ok(serde_json::json!({"taskArn": task.arn.to_string(), "logLines": log_lines}))
}
