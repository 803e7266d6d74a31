use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::MatchedPath;
use axum::{Router, routing::get};
use futures_util::future::BoxFuture;
use http::{Request, StatusCode};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use owo_colors::OwoColorize;
use tokio::net::TcpListener;
use tower::{Layer, Service};

use crate::shutdown::shutdown_signal;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn install_recorder_once() -> &'static PrometheusHandle {
    PROM_HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("install global metrics recorder")
    })
}

/// Renders the current Prometheus text exposition, installing the global
/// recorder on first use. Lets a host server fold `/metrics` into its own
/// router instead of binding the separate server this module also offers.
pub fn render() -> String {
    install_recorder_once().render()
}

/// Serves `/metrics`, `/healthz` and `/readyz` on `admin_port`, tagged with
/// the instance name so a single Prometheus can scrape several instances.
pub async fn run_metrics_server(port: u16, instance: String) {
    let handle = install_recorder_once().clone();
    let metrics_route = {
        let handle = handle.clone();
        get(move || async move { handle.render() })
    };
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ok" }))
        .route("/metrics", metrics_route)
        .layer(MetricsLayer::new(instance));
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind metrics server to {addr}: {e}"));
    println!("{}", format!("📈 metrics server listening on {addr}").green());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("metrics server failed");
}

/// Tower layer recording request count, latency histogram, and in-flight gauge
/// for the ECS/ELBv2 API surface, keyed by `X-Amz-Target` route.
#[derive(Clone)]
pub struct MetricsLayer {
    instance: String,
}

impl MetricsLayer {
    pub fn new(instance: String) -> Self {
        Self { instance }
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;
    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            instance: self.instance.clone(),
        }
    }
}

#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    instance: String,
}

impl<S, B> Service<Request<B>> for MetricsService<S>
where
    S: Service<Request<B>, Response = axum::response::Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let start = Instant::now();
        let method_str = req.method().as_str().to_owned();
        let target = req
            .headers()
            .get("x-amz-target")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_owned())
            .or_else(|| {
                req.extensions()
                    .get::<MatchedPath>()
                    .map(|m| m.as_str().to_owned())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let mut svc = self.inner.clone();
        let fut = svc.call(req);
        let instance = self.instance.clone();

        Box::pin(async move {
            let in_flight = gauge!("kecs_api_in_flight_requests", "target" => target.clone());
            in_flight.increment(1);

            let res = fut.await;
            let elapsed = start.elapsed().as_secs_f64();
            let status = match &res {
                Ok(resp) => resp.status(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };

            histogram!(
                "kecs_api_request_duration_seconds",
                "method" => method_str.clone(),
                "target" => target.clone(),
                "status" => status.as_u16().to_string(),
                "instance" => instance.clone()
            )
            .record(elapsed);

            counter!(
                "kecs_api_requests_total",
                "method" => method_str,
                "target" => target,
                "status" => status.as_u16().to_string(),
                "instance" => instance
            )
            .increment(1);

            in_flight.decrement(1);
            res
        })
    }
}
