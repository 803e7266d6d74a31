//! Decides whether an incoming pod gets AWS-traffic injection and builds the
//! JSON patch for it. Diff-based, not field-by-field construction: build the
//! desired pod in memory, then let `json_patch::diff` produce the minimal
//! patch, mirroring how the rest of this codebase patches live objects.

use k8s_openapi::api::core::v1::{Container, EnvVar, Pod};
use kecs_common::annotations;

pub const SIDECAR_INJECTED_ANNOTATION: &str = "kecs.io/aws-proxy-sidecar-injected";
const INJECT_AWS_PROXY_ANNOTATION: &str = "kecs.io/inject-aws-proxy";
const AWS_PROXY_ENABLED_ANNOTATION: &str = "kecs.io/aws-proxy-enabled";
const AWS_PROXY_MODE_ANNOTATION: &str = "kecs.io/aws-proxy-mode";
const TASK_ID_LABEL: &str = "kecs.dev/task-id";

const SIDECAR_NAME: &str = "kecs-aws-proxy";
const SIDECAR_PORT: u16 = 4566;
const SIDECAR_IMAGE: &str = "kecs/aws-proxy:latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionMode {
    Sidecar,
    Environment,
}

/// Applies the decision table from the injection spec: explicit annotations
/// win, then an `AWS_`-prefixed env var heuristic, then ECS-task-id default.
pub fn should_inject(pod: &Pod) -> bool {
    let annotations = pod.metadata.annotations.as_ref();
    if let Some(v) = annotations.and_then(|a| a.get(INJECT_AWS_PROXY_ANNOTATION)) {
        return v == "true";
    }
    if let Some(v) = annotations.and_then(|a| a.get(AWS_PROXY_ENABLED_ANNOTATION)) {
        if v == "false" {
            return false;
        }
    }
    if has_aws_env(pod) {
        return true;
    }
    pod.metadata
        .labels
        .as_ref()
        .is_some_and(|l| l.contains_key(TASK_ID_LABEL))
}

fn has_aws_env(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .map(|s| &s.containers)
        .into_iter()
        .flatten()
        .flat_map(|c| c.env.iter().flatten())
        .any(|e| e.name.starts_with("AWS_"))
}

fn injection_mode(pod: &Pod) -> InjectionMode {
    match pod
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(AWS_PROXY_MODE_ANNOTATION))
        .map(String::as_str)
    {
        Some("environment") => InjectionMode::Environment,
        _ => InjectionMode::Sidecar,
    }
}

fn already_injected(pod: &Pod) -> bool {
    pod.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(SIDECAR_INJECTED_ANNOTATION))
        .is_some_and(|v| v == "true")
}

/// Builds the mutated pod the webhook wants, or `None` if the pod shouldn't
/// be touched (already injected, or the decision table says no).
pub fn mutate(pod: &Pod, localstack_dns: &str) -> Option<Pod> {
    if already_injected(pod) || !should_inject(pod) {
        return None;
    }

    let mut mutated = pod.clone();
    let annotations = mutated.metadata.annotations.get_or_insert_with(Default::default);
    annotations.insert(SIDECAR_INJECTED_ANNOTATION.to_string(), "true".to_string());
    annotations.insert(annotations::MANAGED_BY.to_string(), "kecs-webhook".to_string());

    let endpoint = match injection_mode(pod) {
        InjectionMode::Sidecar => format!("http://localhost:{SIDECAR_PORT}"),
        InjectionMode::Environment => format!("http://{localstack_dns}:4566"),
    };

    if let Some(spec) = mutated.spec.as_mut() {
        for container in spec.containers.iter_mut() {
            set_aws_endpoint_env(container, &endpoint);
        }
        if injection_mode(pod) == InjectionMode::Sidecar {
            spec.containers.push(sidecar_container(localstack_dns));
        }
    }

    Some(mutated)
}

fn set_aws_endpoint_env(container: &mut Container, endpoint: &str) {
    let env = container.env.get_or_insert_with(Vec::new);
    for name in ["AWS_ENDPOINT_URL", "AWS_ENDPOINT_URL_S3"] {
        if let Some(existing) = env.iter_mut().find(|e| e.name == name) {
            existing.value = Some(endpoint.to_string());
        } else {
            env.push(EnvVar {
                name: name.to_string(),
                value: Some(endpoint.to_string()),
                value_from: None,
            });
        }
    }
}

fn sidecar_container(localstack_dns: &str) -> Container {
    Container {
        name: SIDECAR_NAME.to_string(),
        image: Some(SIDECAR_IMAGE.to_string()),
        env: Some(vec![
            EnvVar {
                name: "UPSTREAM".to_string(),
                value: Some(format!("http://{localstack_dns}:4566")),
                value_from: None,
            },
            EnvVar {
                name: "LISTEN_PORT".to_string(),
                value: Some(SIDECAR_PORT.to_string()),
                value_from: None,
            },
        ]),
        ..Default::default()
    }
}

/// The JSON patch from `pod` to the webhook's mutated pod, or `None` if the
/// pod is left untouched.
pub fn build_patch(pod: &Pod, localstack_dns: &str) -> Option<json_patch::Patch> {
    let mutated = mutate(pod, localstack_dns)?;
    let before = serde_json::to_value(pod).ok()?;
    let after = serde_json::to_value(&mutated).ok()?;
    Some(json_patch::diff(&before, &after))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::PodSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;

    fn pod_with(labels: BTreeMap<String, String>, annotations: BTreeMap<String, String>, env: Vec<EnvVar>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                labels: Some(labels),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container { name: "app".to_string(), env: Some(env), ..Default::default() }],
                ..Default::default()
            }),
            status: None,
        }
    }

    #[test]
    fn forced_off_annotation_wins_over_task_id_label() {
        let mut labels = BTreeMap::new();
        labels.insert(TASK_ID_LABEL.to_string(), "x".to_string());
        let mut annotations = BTreeMap::new();
        annotations.insert(AWS_PROXY_ENABLED_ANNOTATION.to_string(), "false".to_string());
        let pod = pod_with(labels, annotations, vec![]);
        assert!(!should_inject(&pod));
    }

    #[test]
    fn task_id_label_alone_injects_by_default() {
        let mut labels = BTreeMap::new();
        labels.insert(TASK_ID_LABEL.to_string(), "x".to_string());
        let pod = pod_with(labels, BTreeMap::new(), vec![]);
        assert!(should_inject(&pod));
    }

    #[test]
    fn plain_app_label_does_not_inject() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "my-app".to_string());
        let pod = pod_with(labels, BTreeMap::new(), vec![]);
        assert!(!should_inject(&pod));
    }

    #[test]
    fn environment_mode_skips_sidecar_but_sets_env() {
        let mut labels = BTreeMap::new();
        labels.insert(TASK_ID_LABEL.to_string(), "x".to_string());
        let mut annotations = BTreeMap::new();
        annotations.insert(AWS_PROXY_MODE_ANNOTATION.to_string(), "environment".to_string());
        let pod = pod_with(labels, annotations, vec![]);
        let mutated = mutate(&pod, "kecs-localstack.kecs-system.svc").unwrap();
        let spec = mutated.spec.unwrap();
        assert_eq!(spec.containers.len(), 1);
        let env = spec.containers[0].env.as_ref().unwrap();
        assert!(env.iter().any(|e| e.name == "AWS_ENDPOINT_URL" && e.value.as_deref() == Some("http://kecs-localstack.kecs-system.svc:4566")));
    }

    #[test]
    fn already_injected_pods_are_left_alone() {
        let mut labels = BTreeMap::new();
        labels.insert(TASK_ID_LABEL.to_string(), "x".to_string());
        let mut annotations = BTreeMap::new();
        annotations.insert(SIDECAR_INJECTED_ANNOTATION.to_string(), "true".to_string());
        let pod = pod_with(labels, annotations, vec![]);
        assert!(mutate(&pod, "dns").is_none());
    }
}
