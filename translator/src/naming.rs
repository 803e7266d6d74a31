use std::collections::BTreeMap;

/// `kecs-<clusterName>`, matching `Cluster::namespace()`.
pub fn namespace(cluster_name: &str) -> String {
    format!("kecs-{cluster_name}")
}

/// `<serviceName>-<taskId>` for a task started by a service, or just
/// `<taskId>` for a standalone `RunTask` call.
pub fn pod_name(service_name: Option<&str>, task_id: &str) -> String {
    match service_name {
        Some(name) => format!("{name}-{task_id}"),
        None => task_id.to_string(),
    }
}

pub fn deployment_name(service_name: &str) -> String {
    service_name.to_string()
}

pub fn service_account_name(family: &str) -> String {
    format!("{family}-task-role")
}

pub fn labels(cluster_name: &str, service_name: Option<&str>, task_id: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("ecs-cluster".to_string(), cluster_name.to_string());
    if let Some(service_name) = service_name {
        labels.insert("ecs-service".to_string(), service_name.to_string());
    }
    labels.insert("ecs-task".to_string(), task_id.to_string());
    labels.insert("app".to_string(), service_name.unwrap_or(task_id).to_string());
    labels
}

/// The annotation-stable name for the Kubernetes Secret a task definition's
/// `secrets[]` resolve into: derived from the task-definition ARN, never
/// from the SSM/SecretsManager ARN being resolved.
pub fn secret_projection_name(task_definition_arn: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(task_definition_arn.as_bytes());
    format!("kecs-secrets-{}", &hex::encode(digest)[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_name_includes_service_when_present() {
        assert_eq!(pod_name(Some("web"), "abc123"), "web-abc123");
        assert_eq!(pod_name(None, "abc123"), "abc123");
    }

    #[test]
    fn namespace_is_prefixed() {
        assert_eq!(namespace("default"), "kecs-default");
    }

    #[test]
    fn secret_projection_name_is_deterministic() {
        let arn = "arn:aws:ecs:us-east-1:000000000000:task-definition/web:3";
        assert_eq!(secret_projection_name(arn), secret_projection_name(arn));
    }
}
