use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use kecs_common::shutdown::shutdown_signal;

use crate::cert::ServingCert;
use crate::error::{Error, Result};
use crate::review::{AdmissionReview, AdmissionReviewResponse, review};

#[derive(Clone)]
pub struct WebhookState {
    pub localstack_dns: Arc<String>,
}

pub async fn run(cert: ServingCert, port: u16, localstack_dns: String) -> Result<()> {
    let tls_config = RustlsConfig::from_pem(cert.cert_pem.into_bytes(), cert.key_pem.into_bytes())
        .await
        .map_err(Error::Io)?;

    let state = WebhookState { localstack_dns: Arc::new(localstack_dns) };
    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/mutate", post(mutate))
        .with_state(state);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().expect("valid bind address");
    tracing::info!(%addr, "starting kecs admission webhook");

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(10)));
    });

    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(Error::Io)?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn mutate(State(state): State<WebhookState>, Json(body): Json<AdmissionReview>) -> Json<AdmissionReviewResponse> {
    Json(review(&body, &state.localstack_dns))
}
