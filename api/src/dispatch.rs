//! The single `POST /` entry point: classifies by `X-Amz-Target` (or path)
//! and routes to the ECS router, the ELBv2 router, service-discovery, the
//! log-tail handler, or the LocalStack reverse-proxy.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use crate::app::AppContext;
use crate::error::ApiError;
use crate::{elbv2, logs, proxy, service_discovery};

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", post(root))
        .route("/v1/GetTaskLogs", post(get_task_logs))
        .with_state(ctx)
}

async fn root(State(ctx): State<Arc<AppContext>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let target = headers.get("x-amz-target").and_then(|v| v.to_str().ok()).unwrap_or("");

    if target.starts_with("AmazonEC2ContainerServiceV20141113.") {
        return handle_ecs(&ctx, target, body).await;
    }
    if target.starts_with("ElasticLoadBalancing") {
        return handle_elbv2(&ctx, target, body).await;
    }
    if target.contains("ServiceDiscovery") {
        return handle_service_discovery(&ctx, target, body).await;
    }
    if target == "AWSie.GetTaskLogs" {
        return handle_logs(&ctx, body).await;
    }
    if target.is_empty() && uri.path() == "/" {
        return ApiError::UnknownOperation("missing X-Amz-Target".to_string()).into_response();
    }

    let (status, response_headers, response_body) = proxy::forward(&ctx, uri.path(), headers, body).await;
    let mut response = Response::new(Body::from(response_body));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    response
}

async fn get_task_logs(State(ctx): State<Arc<AppContext>>, body: Bytes) -> Response {
    handle_logs(&ctx, body).await
}

async fn handle_ecs(ctx: &AppContext, target: &str, body: Bytes) -> Response {
    let operation = target.rsplit('.').next().unwrap_or("");
    let payload = match decode(&body) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    match crate::ecs::dispatch(ctx, operation, payload).await {
        Ok(value) => json_response(value),
        Err(e) => e.into_response(),
    }
}

async fn handle_elbv2(ctx: &AppContext, target: &str, body: Bytes) -> Response {
    let operation = target.rsplit('.').next().unwrap_or("");
    let payload = match decode(&body) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    match elbv2::dispatch(ctx, operation, payload).await {
        Ok(value) => json_response(value),
        Err(e) => e.into_response(),
    }
}

async fn handle_service_discovery(ctx: &AppContext, target: &str, body: Bytes) -> Response {
    let operation = target.rsplit('.').next().unwrap_or("");
    let payload = match decode(&body) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    match service_discovery::dispatch(ctx, operation, payload).await {
        Ok(value) => json_response(value),
        Err(e) => e.into_response(),
    }
}

async fn handle_logs(ctx: &AppContext, body: Bytes) -> Response {
    let payload = match decode(&body) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    match logs::get_task_logs(ctx, payload).await {
        Ok(value) => json_response(value),
        Err(e) => e.into_response(),
    }
}

fn decode(body: &Bytes) -> Result<serde_json::Value, ApiError> {
    if body.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidParameter(e.to_string()))
}

fn json_response(value: serde_json::Value) -> Response {
    let bytes = serde_json::to_vec(&value).unwrap_or_default();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert("content-type", "application/x-amz-json-1.1".parse().unwrap());
    response
}
