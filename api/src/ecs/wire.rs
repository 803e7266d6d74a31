//! Request/response DTOs for the ECS JSON-1.1 wire, kept separate from the
//! store's snake_case entities: the wire is camelCase and case-sensitive,
//! the store is not.

use kecs_types::{Cluster, ClusterStatus, LaunchType, Service, ServiceStatus, Task, TaskStatus};
use serde::{Deserialize, Serialize};

fn cluster_status_wire(s: ClusterStatus) -> &'static str {
    match s {
        ClusterStatus::Active => "ACTIVE",
        ClusterStatus::Provisioning => "PROVISIONING",
        ClusterStatus::Deprovisioning => "DEPROVISIONING",
        ClusterStatus::Inactive => "INACTIVE",
    }
}

fn service_status_wire(s: ServiceStatus) -> &'static str {
    match s {
        ServiceStatus::Active => "ACTIVE",
        ServiceStatus::Draining => "DRAINING",
        ServiceStatus::Inactive => "INACTIVE",
    }
}

fn task_status_wire(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Provisioning => "PROVISIONING",
        TaskStatus::Pending => "PENDING",
        TaskStatus::Activating => "ACTIVATING",
        TaskStatus::Running => "RUNNING",
        TaskStatus::Deactivating => "DEACTIVATING",
        TaskStatus::Stopping => "STOPPING",
        TaskStatus::Deprovisioning => "DEPROVISIONING",
        TaskStatus::Stopped => "STOPPED",
    }
}

fn launch_type_wire(l: LaunchType) -> &'static str {
    match l {
        LaunchType::Ec2 => "EC2",
        LaunchType::Fargate => "FARGATE",
        LaunchType::External => "EXTERNAL",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWire {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSettingWire {
    pub name: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterWire {
    pub cluster_arn: String,
    pub cluster_name: String,
    pub status: &'static str,
    pub running_tasks_count: i64,
    pub pending_tasks_count: i64,
    pub active_services_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Vec<ClusterSettingWire>>,
}

impl From<&Cluster> for ClusterWire {
    fn from(c: &Cluster) -> Self {
        ClusterWire {
            cluster_arn: c.arn.to_string(),
            cluster_name: c.name.clone(),
            status: cluster_status_wire(c.status),
            running_tasks_count: c.counters.running_tasks_count,
            pending_tasks_count: c.counters.pending_tasks_count,
            active_services_count: c.counters.active_services_count,
            tags: None,
            settings: None,
        }
    }
}

impl ClusterWire {
    pub fn with_settings(mut self, c: &Cluster) -> Self {
        self.settings = Some(vec![ClusterSettingWire {
            name: "containerInsights",
            value: if c.settings.container_insights { "enabled" } else { "disabled" },
        }]);
        self
    }

    pub fn with_tags(mut self, tags: &std::collections::BTreeMap<String, String>) -> Self {
        self.tags = Some(
            tags.iter()
                .map(|(k, v)| TagWire { key: k.clone(), value: v.clone() })
                .collect(),
        );
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWire {
    pub service_arn: String,
    pub service_name: String,
    pub cluster_arn: String,
    pub task_definition: String,
    pub desired_count: u32,
    pub running_count: u32,
    pub pending_count: u32,
    pub launch_type: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagWire>>,
}

impl From<&Service> for ServiceWire {
    fn from(s: &Service) -> Self {
        ServiceWire {
            service_arn: s.arn.to_string(),
            service_name: s.name.clone(),
            cluster_arn: s.cluster_arn.to_string(),
            task_definition: s.task_definition_arn.to_string(),
            desired_count: s.desired_count,
            running_count: s.running_count,
            pending_count: s.pending_count,
            launch_type: launch_type_wire(s.launch_type),
            status: service_status_wire(s.status),
            tags: None,
        }
    }
}

impl ServiceWire {
    pub fn with_tags(mut self, tags: &std::collections::BTreeMap<String, String>) -> Self {
        self.tags = Some(
            tags.iter()
                .map(|(k, v)| TagWire { key: k.clone(), value: v.clone() })
                .collect(),
        );
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWire {
    pub task_arn: String,
    pub cluster_arn: String,
    pub task_definition_arn: String,
    pub group: Option<String>,
    pub last_status: &'static str,
    pub desired_status: &'static str,
    pub started_by: Option<String>,
    pub stopped_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagWire>>,
}

impl From<&Task> for TaskWire {
    fn from(t: &Task) -> Self {
        TaskWire {
            task_arn: t.arn.to_string(),
            cluster_arn: t.cluster_arn.to_string(),
            task_definition_arn: t.task_definition_arn.to_string(),
            group: t.group.clone(),
            last_status: task_status_wire(t.last_status),
            desired_status: task_status_wire(t.desired_status),
            started_by: t.started_by.clone(),
            stopped_reason: t.stopped_reason.clone(),
            tags: None,
        }
    }
}

impl TaskWire {
    pub fn with_tags(mut self, tags: &std::collections::BTreeMap<String, String>) -> Self {
        self.tags = Some(
            tags.iter()
                .map(|(k, v)| TagWire { key: k.clone(), value: v.clone() })
                .collect(),
        );
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub arn: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinitionWire {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub entry_point: Vec<String>,
    #[serde(default)]
    pub environment: Vec<KeyValuePairWire>,
    #[serde(default = "default_essential")]
    pub essential: bool,
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
    #[serde(default)]
    pub port_mappings: Vec<PortMappingWire>,
}

fn default_essential() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct KeyValuePairWire {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PortMappingWire {
    pub container_port: u16,
    pub host_port: Option<u16>,
    pub protocol: Option<String>,
}
