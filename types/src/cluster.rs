use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arn::Arn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterStatus {
    Active,
    Provisioning,
    Deprovisioning,
    Inactive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterCounters {
    pub running_tasks_count: i64,
    pub pending_tasks_count: i64,
    pub active_services_count: i64,
    pub container_instances_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSettings {
    pub container_insights: bool,
}

/// LocalStack's deployment state for a given instance, as observed by the
/// instance lifecycle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalStackState {
    NotDeployed,
    Deploying,
    Deployed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub arn: Arn,
    pub name: String,
    pub status: ClusterStatus,
    pub counters: ClusterCounters,
    pub settings: ClusterSettings,
    /// Name of the backing k3d/in-cluster namespace-equivalent; empty until
    /// the instance manager has provisioned it.
    pub k8s_cluster_name: String,
    pub local_stack_state: LocalStackState,
    pub created_at: i64,
    pub version: u64,
}

impl Cluster {
    pub fn new(arn: Arn, name: String, k8s_cluster_name: String, created_at: i64) -> Self {
        Cluster {
            arn,
            name,
            status: ClusterStatus::Provisioning,
            counters: ClusterCounters::default(),
            settings: ClusterSettings::default(),
            k8s_cluster_name,
            local_stack_state: LocalStackState::NotDeployed,
            created_at,
            version: 0,
        }
    }

    /// The Kubernetes namespace that backs this cluster.
    pub fn namespace(&self) -> String {
        format!("kecs-{}", self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tags(pub BTreeMap<String, String>);
