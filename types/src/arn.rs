use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The ECS resource kinds that appear in the `<type>` segment of an ARN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cluster,
    Service,
    Task,
    TaskDefinition,
    TaskSet,
    ContainerInstance,
}

impl ResourceKind {
    fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Cluster => "cluster",
            ResourceKind::Service => "service",
            ResourceKind::Task => "task",
            ResourceKind::TaskDefinition => "task-definition",
            ResourceKind::TaskSet => "task-set",
            ResourceKind::ContainerInstance => "container-instance",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "cluster" => Some(ResourceKind::Cluster),
            "service" => Some(ResourceKind::Service),
            "task" => Some(ResourceKind::Task),
            "task-definition" => Some(ResourceKind::TaskDefinition),
            "task-set" => Some(ResourceKind::TaskSet),
            "container-instance" => Some(ResourceKind::ContainerInstance),
            _ => None,
        }
    }
}

/// `arn:aws:ecs:<region>:<account>:<type>/<cluster>/<name>`, or for
/// task-definitions `arn:aws:ecs:<region>:<account>:task-definition/<family>:<revision>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Arn {
    region: String,
    account: String,
    kind: ResourceKindStored,
    /// Path segments after `<type>/`: `[cluster, name]` for most kinds, or
    /// `[family:revision]` for task-definitions, `[cluster, id]` for task-sets.
    path: Vec<String>,
}

// serde can't derive on a non-owned enum with methods easily alongside Copy;
// store the kind as its canonical string so round-tripping is exact.
type ResourceKindStored = ResourceKind;

#[derive(Debug, thiserror::Error)]
pub enum ArnParseError {
    #[error("ARN {0:?} does not have the expected arn:aws:ecs:<region>:<account>:<type>/... shape")]
    Malformed(String),
    #[error("unknown ECS resource type {0:?}")]
    UnknownKind(String),
}

impl Arn {
    pub fn cluster(region: &str, account: &str, cluster_name: &str) -> Self {
        Arn {
            region: region.to_string(),
            account: account.to_string(),
            kind: ResourceKind::Cluster,
            path: vec![cluster_name.to_string()],
        }
    }

    pub fn service(region: &str, account: &str, cluster_name: &str, service_name: &str) -> Self {
        Arn {
            region: region.to_string(),
            account: account.to_string(),
            kind: ResourceKind::Service,
            path: vec![cluster_name.to_string(), service_name.to_string()],
        }
    }

    pub fn task(region: &str, account: &str, cluster_name: &str, task_id: &str) -> Self {
        Arn {
            region: region.to_string(),
            account: account.to_string(),
            kind: ResourceKind::Task,
            path: vec![cluster_name.to_string(), task_id.to_string()],
        }
    }

    pub fn task_set(region: &str, account: &str, cluster_name: &str, task_set_id: &str) -> Self {
        Arn {
            region: region.to_string(),
            account: account.to_string(),
            kind: ResourceKind::TaskSet,
            path: vec![cluster_name.to_string(), task_set_id.to_string()],
        }
    }

    pub fn container_instance(region: &str, account: &str, cluster_name: &str, id: &str) -> Self {
        Arn {
            region: region.to_string(),
            account: account.to_string(),
            kind: ResourceKind::ContainerInstance,
            path: vec![cluster_name.to_string(), id.to_string()],
        }
    }

    pub fn task_definition(region: &str, account: &str, family: &str, revision: u32) -> Self {
        Arn {
            region: region.to_string(),
            account: account.to_string(),
            kind: ResourceKind::TaskDefinition,
            path: vec![format!("{family}:{revision}")],
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// For cluster/service/task/task-set/container-instance ARNs, the owning
    /// cluster's short name (first path segment).
    pub fn cluster_name(&self) -> Option<&str> {
        match self.kind {
            ResourceKind::TaskDefinition => None,
            _ => self.path.first().map(String::as_str),
        }
    }

    /// The final path segment: a service/task-set name, a task id, a
    /// container-instance id, or (for clusters) the cluster name itself.
    pub fn short_name(&self) -> &str {
        self.path.last().expect("ARN always has >= 1 path segment")
    }

    /// For task-definitions, `(family, revision)`.
    pub fn family_revision(&self) -> Option<(&str, u32)> {
        if self.kind != ResourceKind::TaskDefinition {
            return None;
        }
        let raw = self.path.first()?;
        let (family, rev) = raw.rsplit_once(':')?;
        Some((family, rev.parse().ok()?))
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:aws:ecs:{}:{}:{}/{}",
            self.region,
            self.account,
            self.kind.as_str(),
            self.path.join("/")
        )
    }
}

impl FromStr for Arn {
    type Err = ArnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("arn:aws:ecs:")
            .ok_or_else(|| ArnParseError::Malformed(s.to_string()))?;
        let mut parts = rest.splitn(3, ':');
        let region = parts.next().ok_or_else(|| ArnParseError::Malformed(s.to_string()))?;
        let account = parts.next().ok_or_else(|| ArnParseError::Malformed(s.to_string()))?;
        let type_and_path = parts.next().ok_or_else(|| ArnParseError::Malformed(s.to_string()))?;
        let (kind_str, path_str) = type_and_path
            .split_once('/')
            .ok_or_else(|| ArnParseError::Malformed(s.to_string()))?;
        let kind = ResourceKind::from_str(kind_str)
            .ok_or_else(|| ArnParseError::UnknownKind(kind_str.to_string()))?;
        let path: Vec<String> = path_str.split('/').map(str::to_string).collect();
        if path.is_empty() || path.iter().any(String::is_empty) {
            return Err(ArnParseError::Malformed(s.to_string()));
        }
        Ok(Arn {
            region: region.to_string(),
            account: account.to_string(),
            kind,
            path,
        })
    }
}

impl From<Arn> for String {
    fn from(arn: Arn) -> String {
        arn.to_string()
    }
}

impl TryFrom<String> for Arn {
    type Error = ArnParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_arn_round_trips() {
        let arn = Arn::cluster("us-east-1", "000000000000", "default");
        let s = arn.to_string();
        assert_eq!(s, "arn:aws:ecs:us-east-1:000000000000:cluster/default");
        assert_eq!(s.parse::<Arn>().unwrap(), arn);
    }

    #[test]
    fn task_definition_arn_carries_family_and_revision() {
        let arn = Arn::task_definition("us-east-1", "000000000000", "nginx-web", 3);
        assert_eq!(
            arn.to_string(),
            "arn:aws:ecs:us-east-1:000000000000:task-definition/nginx-web:3"
        );
        assert_eq!(arn.family_revision(), Some(("nginx-web", 3)));
    }

    #[test]
    fn service_arn_exposes_cluster_and_short_name() {
        let arn = Arn::service("us-east-1", "000000000000", "default", "web");
        assert_eq!(arn.cluster_name(), Some("default"));
        assert_eq!(arn.short_name(), "web");
    }

    #[test]
    fn malformed_arn_is_rejected() {
        assert!("not-an-arn".parse::<Arn>().is_err());
        assert!("arn:aws:ecs:us-east-1:000:cluster/".parse::<Arn>().is_err());
    }
}
