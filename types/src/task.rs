use serde::{Deserialize, Serialize};

use crate::arn::Arn;

/// States form a strict order; `last_status` only ever advances forward and
/// once `Stopped` is reached a task is never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStatus {
    Provisioning,
    Pending,
    Activating,
    Running,
    Deactivating,
    Stopping,
    Deprovisioning,
    Stopped,
}

impl TaskStatus {
    pub const ORDER: [TaskStatus; 8] = [
        TaskStatus::Provisioning,
        TaskStatus::Pending,
        TaskStatus::Activating,
        TaskStatus::Running,
        TaskStatus::Deactivating,
        TaskStatus::Stopping,
        TaskStatus::Deprovisioning,
        TaskStatus::Stopped,
    ];

    fn rank(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap()
    }

    /// Whether moving from `self` to `next` respects the monotone ordering
    /// of invariant (b): a status never moves backwards.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        next.rank() >= self.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRuntime {
    pub name: String,
    pub last_status: String,
    pub health_status: HealthStatus,
    pub exit_code: Option<i32>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub arn: Arn,
    pub cluster_arn: Arn,
    pub task_definition_arn: Arn,
    pub service_arn: Option<Arn>,
    pub desired_status: TaskStatus,
    pub last_status: TaskStatus,
    pub containers: Vec<ContainerRuntime>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub started_by: Option<String>,
    pub group: Option<String>,
    pub started_at: Option<i64>,
    pub stopped_at: Option<i64>,
    pub stopped_reason: Option<String>,
    pub connectivity: Connectivity,
    pub pod_name: Option<String>,
    pub namespace: Option<String>,
    pub version: u64,
}

impl Task {
    /// Invariant (d): container count must mirror the task-definition's
    /// container-definition count. Checked by callers that hold both.
    pub fn has_container_count(&self, expected: usize) -> bool {
        self.containers.len() == expected
    }

    /// Attempts to move `last_status` forward; returns `false` (no-op) if
    /// `next` would violate the monotone ordering (invariant b).
    pub fn try_advance_last_status(&mut self, next: TaskStatus) -> bool {
        if !self.last_status.can_advance_to(next) {
            return false;
        }
        self.last_status = next;
        true
    }
}
