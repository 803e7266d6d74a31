//! Admin/health router, served on the admin port (default 8081) separately
//! from the AWS-wire port.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::app::AppContext;

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .route("/api/instances", get(instances))
        .route("/api/localstack/status", get(localstack_status))
        .with_state(ctx)
}

async fn metrics() -> impl IntoResponse {
    kecs_common::metrics::render()
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn ready(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    if ctx.store.list_clusters(Some(1), None).is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"ready": false, "reason": "store unavailable"})));
    }
    if ctx.test_mode() {
        return (StatusCode::OK, Json(json!({"ready": true})));
    }

    let health_url = format!("{}/_localstack/health", ctx.localstack_base_url);
    match ctx.http.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => (StatusCode::OK, Json(json!({"ready": true}))),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"ready": false, "reason": "localstack unreachable"})),
        ),
    }
}

async fn instances(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let (clusters, _) = ctx.store.list_clusters(Some(100), None).unwrap_or_default();
    let names: Vec<String> = clusters.into_iter().map(|c| c.name).collect();
    Json(json!({"instances": names}))
}

async fn localstack_status(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let health_url = format!("{}/_localstack/health", ctx.localstack_base_url);
    match ctx.http.get(&health_url).send().await {
        Ok(resp) => {
            let body: serde_json::Value = resp.json().await.unwrap_or(json!({}));
            Json(json!({"enabledServices": ctx.enabled_services, "health": body}))
        }
        Err(e) => Json(json!({"enabledServices": ctx.enabled_services, "error": e.to_string()})),
    }
}
