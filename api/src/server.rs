use std::any::Any as AnyPanic;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::response::Response;
use http::StatusCode;
use kecs_common::shutdown::shutdown_signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::app::AppContext;
use crate::{admin, dispatch};

/// Runs the AWS-wire server and the admin server side by side until either
/// receives a shutdown signal.
pub async fn run(ctx: Arc<AppContext>, wire_port: u16, admin_port: u16) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let instance = std::env::var("KECS_INSTANCE").unwrap_or_else(|_| "default".to_string());
    let wire_router = dispatch::router(ctx.clone())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors.clone())
        .layer(axum::middleware::from_fn(kecs_common::attach))
        .layer(kecs_common::metrics::MetricsLayer::new(instance));
    let admin_router = admin::router(ctx.clone());

    let wire_addr: SocketAddr = format!("0.0.0.0:{wire_port}").parse().context("parsing wire bind address")?;
    let admin_addr: SocketAddr = format!("0.0.0.0:{admin_port}").parse().context("parsing admin bind address")?;

    tracing::info!(%wire_addr, %admin_addr, "starting kecs api server");

    let wire_listener = tokio::net::TcpListener::bind(wire_addr).await.context("binding wire listener")?;
    let admin_listener = tokio::net::TcpListener::bind(admin_addr).await.context("binding admin listener")?;

    let wire_server = axum::serve(wire_listener, wire_router).with_graceful_shutdown(shutdown_signal());
    let admin_server = axum::serve(admin_listener, admin_router).with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(
        async { wire_server.await.context("wire server") },
        async { admin_server.await.context("admin server") },
    )?;

    tracing::info!("kecs api server stopped gracefully");
    Ok(())
}

/// Converts a panic unwound during request handling into the same
/// `ServerException` shape every other internal failure produces, per the
/// "panics are recovered at the HTTP boundary" propagation rule. Runs inside
/// `kecs_common::attach`, so the response still gets an `x-amzn-requestid`
/// header stamped on the way back out.
fn handle_panic(err: Box<dyn AnyPanic + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "recovered panic at http boundary");
    let body = serde_json::json!({"__type": "ServerException", "message": "internal error"});
    let mut response = Response::new(Body::from(serde_json::to_vec(&body).unwrap_or_default()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert("content-type", "application/x-amz-json-1.1".parse().unwrap());
    response
}
