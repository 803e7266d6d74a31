use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use kube::runtime::controller::Action;
use kecs_common::annotations;
use kecs_types::TaskStatus;
use owo_colors::OwoColorize;

use crate::context::ReconcileContext;
use crate::error::{Error, Result};
use crate::pod_status;

const PROBE_INTERVAL: Duration = Duration::from_secs(10);
const TRANSIENT_RETRY: Duration = Duration::from_secs(2);

/// Reconciles one Pod owned by KECS: derives the task status the Pod's
/// conditions imply and advances the corresponding `Task` row to match.
/// Never creates or deletes pods; that belongs to the translator/api layer.
pub async fn reconcile(pod: Arc<Pod>, ctx: Arc<ReconcileContext>) -> Result<Action> {
    let Some(task_arn) = pod.annotations().get(annotations::TASK_ARN) else {
        // Not a KECS-managed pod (or annotations stripped); nothing to do.
        return Ok(Action::await_change());
    };

    let task = match ctx.store.get_task(task_arn) {
        Ok(task) => task,
        Err(kecs_store::StoreError::NotFound(_)) => {
            tracing::warn!(task_arn, "pod references a task no longer in the store");
            return Ok(Action::await_change());
        }
        Err(e) => return Err(Error::Store(e)),
    };

    if task.last_status == TaskStatus::Stopped {
        return Ok(Action::await_change());
    }

    let Some(next) = pod_status::derive_task_status(&pod) else {
        return Ok(Action::requeue(TRANSIENT_RETRY));
    };

    if next == task.last_status {
        return Ok(Action::requeue(PROBE_INTERVAL));
    }

    let updated = match ctx.store.advance_task_status(task_arn, task.version, next) {
        Ok(task) => task,
        Err(kecs_store::StoreError::ConcurrentModification { .. }) => {
            return Ok(Action::requeue(TRANSIENT_RETRY));
        }
        Err(e) => return Err(Error::Store(e)),
    };

    if updated.last_status != task.last_status {
        println!(
            "{}",
            format!(
                "task {} {} -> {:?}",
                task_arn,
                pod.name_any(),
                updated.last_status
            )
            .green()
        );
        let mut payload = serde_json::json!({ "lastStatus": format!("{:?}", updated.last_status) });
        if updated.last_status == TaskStatus::Stopped
            && let Some(reason) = pod_status::stop_reason(&pod)
        {
            payload["stoppedReason"] = serde_json::Value::String(reason);
        }
        ctx.store
            .append_event(task_arn, "TASK", "STATUS_CHANGE", now_unix(), payload, task_arn)?;
    }

    Ok(Action::requeue(PROBE_INTERVAL))
}

pub fn on_error(pod: Arc<Pod>, error: &Error, _ctx: Arc<ReconcileContext>) -> Action {
    tracing::error!(pod = %pod.name_any(), %error, "pod reconciliation failed");
    Action::requeue(Duration::from_secs(5))
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
