use serde::{Deserialize, Serialize};

use crate::arn::Arn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerInstanceStatus {
    Active,
    Draining,
    Inactive,
}

/// Synthetic record representing a node; created implicitly the first time
/// a task is placed on a previously-unseen Kubernetes node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInstance {
    pub arn: Arn,
    pub cluster_arn: Arn,
    pub ec2_instance_id: Option<String>,
    pub node_name: String,
    pub status: ContainerInstanceStatus,
    pub running_tasks_count: u32,
    pub pending_tasks_count: u32,
    pub registered_at: i64,
}
