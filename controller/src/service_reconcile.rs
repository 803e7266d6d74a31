use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use kube::runtime::controller::Action;
use kecs_common::annotations;

use crate::context::ReconcileContext;
use crate::error::{Error, Result};

const PROBE_INTERVAL: Duration = Duration::from_secs(10);

/// Reconciles a Deployment owned by KECS: mirrors its replica counts onto
/// the `Service` row's `runningCount`/`pendingCount`.
pub async fn reconcile(deployment: Arc<Deployment>, ctx: Arc<ReconcileContext>) -> Result<Action> {
    let Some(service_arn) = deployment.annotations().get(annotations::SERVICE_ARN) else {
        return Ok(Action::await_change());
    };

    let service = match ctx.store.get_service(service_arn) {
        Ok(service) => service,
        Err(kecs_store::StoreError::NotFound(_)) => {
            tracing::warn!(service_arn, "deployment references a service no longer in the store");
            return Ok(Action::await_change());
        }
        Err(e) => return Err(Error::Store(e)),
    };

    let status = deployment.status.clone().unwrap_or_default();
    let ready = status.ready_replicas.unwrap_or(0).max(0) as u32;
    let total = status.replicas.unwrap_or(0).max(0) as u32;
    let pending = total.saturating_sub(ready);

    if service.running_count == ready && service.pending_count == pending {
        return Ok(Action::requeue(PROBE_INTERVAL));
    }

    ctx.store.update_service_cas(service_arn, service.version, move |s| {
        s.running_count = ready;
        s.pending_count = pending;
    })?;

    tracing::debug!(
        deployment = %deployment.name_any(),
        service_arn,
        ready,
        pending,
        "synced service counts from deployment status"
    );

    Ok(Action::requeue(PROBE_INTERVAL))
}

pub fn on_error(deployment: Arc<Deployment>, error: &Error, _ctx: Arc<ReconcileContext>) -> Action {
    tracing::error!(deployment = %deployment.name_any(), %error, "deployment reconciliation failed");
    Action::requeue(Duration::from_secs(5))
}
