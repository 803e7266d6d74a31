use serde::{Deserialize, Serialize};

use crate::arn::Arn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskDefinitionStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkMode {
    Bridge,
    Host,
    Awsvpc,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchCompatibility {
    Ec2,
    Fargate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: Option<u16>,
    pub protocol: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

/// `valueFrom` names an SSM parameter ARN or a SecretsManager secret ARN;
/// the translator resolves it without ever writing the ARN into a pod spec
/// verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretSource {
    pub name: String,
    pub value_from: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogDriver {
    Awslogs,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfiguration {
    pub log_driver: LogDriver,
    pub options: std::collections::BTreeMap<String, String>,
}

impl LogConfiguration {
    pub fn awslogs_group(&self) -> Option<&str> {
        self.options.get("awslogs-group").map(String::as_str)
    }

    pub fn awslogs_stream_prefix(&self) -> Option<&str> {
        self.options
            .get("awslogs-stream-prefix")
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub command: Vec<String>,
    pub interval_seconds: u32,
    pub timeout_seconds: u32,
    pub retries: u32,
    pub start_period_seconds: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerDependencyCondition {
    Start,
    Complete,
    Success,
    Healthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDependency {
    pub container_name: String,
    pub condition: ContainerDependencyCondition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountPoint {
    pub source_volume: String,
    pub container_path: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub entry_point: Vec<String>,
    pub environment: Vec<KeyValuePair>,
    pub secrets: Vec<SecretSource>,
    pub port_mappings: Vec<PortMapping>,
    pub essential: bool,
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
    pub memory_reservation: Option<u32>,
    pub log_configuration: Option<LogConfiguration>,
    pub health_check: Option<HealthCheck>,
    pub depends_on: Vec<ContainerDependency>,
    pub mount_points: Vec<MountPoint>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum VolumeBacking {
    EmptyDir,
    HostPath,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub backing: VolumeBacking,
    pub host_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfiguration {
    pub container_name: Option<String>,
    pub properties: std::collections::BTreeMap<String, String>,
}

/// Immutable once registered. Keyed by `(family, revision)`; never mutated
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub arn: Arn,
    pub family: String,
    pub revision: u32,
    pub status: TaskDefinitionStatus,
    pub container_definitions: Vec<ContainerDefinition>,
    pub volumes: Vec<Volume>,
    pub network_mode: NetworkMode,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub compatibilities: Vec<LaunchCompatibility>,
    pub proxy_configuration: Option<ProxyConfiguration>,
    pub task_role_arn: Option<String>,
    pub execution_role_arn: Option<String>,
    pub registered_at: i64,
    pub deregistered_at: Option<i64>,
}

impl TaskDefinition {
    pub fn family_revision(&self) -> String {
        format!("{}:{}", self.family, self.revision)
    }
}
