use serde::{Deserialize, Serialize};

use crate::arn::Arn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchType {
    Ec2,
    Fargate,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingStrategy {
    Replica,
    Daemon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentControllerType {
    Ecs,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    Active,
    Draining,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfiguration {
    pub minimum_healthy_percent: u32,
    pub maximum_percent: u32,
}

impl Default for DeploymentConfiguration {
    fn default() -> Self {
        DeploymentConfiguration {
            minimum_healthy_percent: 100,
            maximum_percent: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub target_group_arn: Option<String>,
    pub container_name: String,
    pub container_port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfiguration {
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub assign_public_ip: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEvent {
    pub id: String,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub arn: Arn,
    pub name: String,
    pub cluster_arn: Arn,
    pub task_definition_arn: Arn,
    pub desired_count: u32,
    pub running_count: u32,
    pub pending_count: u32,
    pub launch_type: LaunchType,
    pub deployment_config: DeploymentConfiguration,
    pub network_config: NetworkConfiguration,
    pub load_balancers: Vec<LoadBalancer>,
    pub events: Vec<ServiceEvent>,
    pub scheduling_strategy: SchedulingStrategy,
    pub deployment_controller: DeploymentControllerType,
    pub status: ServiceStatus,
    pub version: u64,
}

impl Service {
    /// Invariant (a): running + pending must not exceed the deployment's
    /// expanded ceiling during a rollout.
    pub fn within_deployment_ceiling(&self) -> bool {
        let ceiling = self.desired_count as u64
            + (self.desired_count as u64 * self.deployment_config.maximum_percent as u64) / 100;
        (self.running_count as u64 + self.pending_count as u64) <= ceiling
    }
}
