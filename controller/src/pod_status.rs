use k8s_openapi::api::core::v1::Pod;
use kecs_types::TaskStatus;

/// Maps observed Pod state onto the next point on ECS's monotone task-status
/// ladder. Returns `None` when nothing new can be inferred yet; the caller
/// leaves the task's `last_status` untouched and requeues.
pub fn derive_task_status(pod: &Pod) -> Option<TaskStatus> {
    if pod.metadata.deletion_timestamp.is_some() {
        return Some(TaskStatus::Deprovisioning);
    }

    let status = pod.status.as_ref()?;
    match status.phase.as_deref() {
        Some("Pending") => Some(scheduled(pod).then_some(TaskStatus::Pending).unwrap_or(TaskStatus::Provisioning)),
        Some("Running") => Some(if all_containers_ready(pod) {
            TaskStatus::Running
        } else {
            TaskStatus::Activating
        }),
        Some("Succeeded") | Some("Failed") => Some(TaskStatus::Stopped),
        _ => None,
    }
}

fn scheduled(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "PodScheduled" && c.status == "True")
        })
}

fn all_containers_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .is_some_and(|statuses| !statuses.is_empty() && statuses.iter().all(|c| c.ready))
}

/// The reason a task stopped, surfaced onto `Task::stopped_reason` from the
/// terminated container with the least-benign exit.
pub fn stop_reason(pod: &Pod) -> Option<String> {
    let statuses = pod.status.as_ref()?.container_statuses.as_ref()?;
    statuses
        .iter()
        .filter_map(|c| c.state.as_ref()?.terminated.as_ref())
        .find(|t| t.exit_code != 0)
        .map(|t| {
            format!(
                "exit code {}: {}",
                t.exit_code,
                t.reason.as_deref().unwrap_or("unknown")
            )
        })
        .or_else(|| Some("essential container exited".to_string()))
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{ContainerStatus, PodCondition, PodStatus};

    use super::*;

    fn pod_with_phase(phase: &str) -> Pod {
        Pod {
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn pending_without_scheduling_is_provisioning() {
        assert_eq!(derive_task_status(&pod_with_phase("Pending")), Some(TaskStatus::Provisioning));
    }

    #[test]
    fn pending_after_scheduling_is_pending() {
        let mut pod = pod_with_phase("Pending");
        pod.status.as_mut().unwrap().conditions = Some(vec![PodCondition {
            type_: "PodScheduled".to_string(),
            status: "True".to_string(),
            ..Default::default()
        }]);
        assert_eq!(derive_task_status(&pod), Some(TaskStatus::Pending));
    }

    #[test]
    fn running_with_unready_containers_is_activating() {
        let mut pod = pod_with_phase("Running");
        pod.status.as_mut().unwrap().container_statuses = Some(vec![ContainerStatus {
            name: "app".to_string(),
            ready: false,
            ..Default::default()
        }]);
        assert_eq!(derive_task_status(&pod), Some(TaskStatus::Activating));
    }

    #[test]
    fn running_with_ready_containers_is_running() {
        let mut pod = pod_with_phase("Running");
        pod.status.as_mut().unwrap().container_statuses = Some(vec![ContainerStatus {
            name: "app".to_string(),
            ready: true,
            ..Default::default()
        }]);
        assert_eq!(derive_task_status(&pod), Some(TaskStatus::Running));
    }

    #[test]
    fn succeeded_and_failed_both_stop_the_task() {
        assert_eq!(derive_task_status(&pod_with_phase("Succeeded")), Some(TaskStatus::Stopped));
        assert_eq!(derive_task_status(&pod_with_phase("Failed")), Some(TaskStatus::Stopped));
    }

    #[test]
    fn deletion_timestamp_always_wins() {
        let mut pod = pod_with_phase("Running");
        pod.metadata.deletion_timestamp = Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
            chrono::Utc::now(),
        ));
        assert_eq!(derive_task_status(&pod), Some(TaskStatus::Deprovisioning));
    }
}
