use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use kube::runtime::Controller;
use kube::runtime::controller::Config;
use kube::runtime::watcher;
use owo_colors::OwoColorize;
use kecs_store::Store;

use crate::context::ReconcileContext;
use crate::{pod_reconcile, service_reconcile};

/// Reconciliations run with bounded parallelism so a burst of pod churn in
/// one cluster can't starve reconciliation of another.
const CONCURRENCY: u16 = 2;

/// Runs the Pod and Deployment reconcilers until `shutdown_on_signal` fires,
/// then drains in-flight reconciliations before returning. Every namespace is
/// watched; resources without KECS's annotations are skipped inside each
/// reconciler rather than filtered at the watch, since not every cluster
/// reserves a dedicated label for KECS-managed objects.
pub async fn run(client: Client, store: Arc<Store>) {
    println!("{}", "starting kecs controller".green());
    let ctx = ReconcileContext::new(client.clone(), store);

    let managed = watcher::Config::default();

    let pods = Controller::new(Api::<Pod>::all(client.clone()), managed.clone())
        .with_config(Config::default().concurrency(CONCURRENCY))
        .shutdown_on_signal()
        .run(pod_reconcile::reconcile, pod_reconcile::on_error, ctx.clone())
        .for_each(|result| async move {
            if let Err(e) = result {
                tracing::warn!(error = %e, "pod reconcile stream error");
            }
        });

    let deployments = Controller::new(Api::<Deployment>::all(client), managed)
        .with_config(Config::default().concurrency(CONCURRENCY))
        .shutdown_on_signal()
        .run(service_reconcile::reconcile, service_reconcile::on_error, ctx)
        .for_each(|result| async move {
            if let Err(e) = result {
                tracing::warn!(error = %e, "deployment reconcile stream error");
            }
        });

    futures::future::join(pods, deployments).await;
    println!("{}", "controller drained, exiting".yellow());
}
