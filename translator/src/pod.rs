use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, ExecAction, Pod, PodSpec, PodTemplateSpec,
    Probe, ResourceRequirements, SecretKeySelector, Volume as K8sVolume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kecs_types::{
    Arn, ContainerDefinition, LogConfiguration, TaskDefinition, Volume, VolumeBacking,
};

use crate::naming;
use crate::overrides::RunTaskOverrides;

pub const TASK_ARN_ANNOTATION: &str = "kecs.dev/task-arn";
pub const TASK_DEFINITION_REVISION_ANNOTATION: &str = "kecs.dev/task-definition-revision";
pub const PROXY_INJECT_ANNOTATION: &str = "kecs.dev/proxy-inject";

/// Builds the Pod for one task. Pure: identical `task_definition`/`cluster_name`/
/// `task_id`/`overrides` always produce an identical spec.
pub fn build_pod(
    task_definition: &TaskDefinition,
    cluster_name: &str,
    task_id: &str,
    service_name: Option<&str>,
    overrides: &RunTaskOverrides,
) -> Pod {
    let namespace = naming::namespace(cluster_name);
    let name = naming::pod_name(service_name, task_id);
    let mut labels = naming::labels(cluster_name, service_name, task_id);
    labels.insert(
        "ecs-task-definition-family".to_string(),
        task_definition.family.clone(),
    );

    let mut annotations = BTreeMap::new();
    annotations.insert(
        TASK_ARN_ANNOTATION.to_string(),
        task_definition.arn.to_string(),
    );
    annotations.insert(
        TASK_DEFINITION_REVISION_ANNOTATION.to_string(),
        task_definition.revision.to_string(),
    );
    if let Some(proxy) = &task_definition.proxy_configuration {
        if let Some(container_name) = &proxy.container_name {
            annotations.insert(PROXY_INJECT_ANNOTATION.to_string(), container_name.clone());
        }
    }

    let containers = task_definition
        .container_definitions
        .iter()
        .map(|c| build_container(c, &task_definition.arn, task_definition.cpu.as_deref(), overrides))
        .collect();

    let volumes = task_definition.volumes.iter().map(build_volume).collect();

    Pod {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(namespace),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers,
            volumes: Some(volumes),
            service_account_name: task_definition
                .task_role_arn
                .as_ref()
                .map(|_| naming::service_account_name(&task_definition.family)),
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        status: None,
    }
}

/// Builds the reusable template a `Deployment` stamps into each replica.
/// Unlike [`build_pod`] this carries no task id: replica identity comes
/// from the `ReplicaSet`/`Deployment` controller, not from ECS.
pub fn build_pod_template(
    task_definition: &TaskDefinition,
    cluster_name: &str,
    service_name: &str,
) -> PodTemplateSpec {
    let mut labels = naming::labels(cluster_name, Some(service_name), service_name);
    labels.remove("ecs-task");
    labels.insert(
        "ecs-task-definition-family".to_string(),
        task_definition.family.clone(),
    );

    let mut annotations = BTreeMap::new();
    annotations.insert(
        TASK_DEFINITION_REVISION_ANNOTATION.to_string(),
        task_definition.arn.to_string(),
    );

    let overrides = RunTaskOverrides::default();
    let containers = task_definition
        .container_definitions
        .iter()
        .map(|c| build_container(c, &task_definition.arn, task_definition.cpu.as_deref(), &overrides))
        .collect();
    let volumes = task_definition.volumes.iter().map(build_volume).collect();

    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers,
            volumes: Some(volumes),
            service_account_name: task_definition
                .task_role_arn
                .as_ref()
                .map(|_| naming::service_account_name(&task_definition.family)),
            restart_policy: Some("Always".to_string()),
            ..Default::default()
        }),
    }
}

fn build_container(
    def: &ContainerDefinition,
    task_definition_arn: &Arn,
    task_cpu: Option<&str>,
    overrides: &RunTaskOverrides,
) -> Container {
    let ov = overrides.for_container(&def.name);

    let command = ov
        .and_then(|o| o.command.clone())
        .unwrap_or_else(|| def.entry_point.clone());
    let args = if ov.and_then(|o| o.command.as_ref()).is_some() {
        Vec::new()
    } else {
        def.command.clone()
    };

    let mut env: Vec<EnvVar> = def
        .environment
        .iter()
        .map(|kv| EnvVar {
            name: kv.name.clone(),
            value: Some(kv.value.clone()),
            ..Default::default()
        })
        .collect();
    if let Some(overridden) = ov.and_then(|o| o.environment.as_ref()) {
        for kv in overridden {
            env.retain(|e| e.name != kv.name);
            env.push(EnvVar {
                name: kv.name.clone(),
                value: Some(kv.value.clone()),
                ..Default::default()
            });
        }
    }

    let secret_name = naming::secret_projection_name(&task_definition_arn.to_string());
    for secret in &def.secrets {
        env.push(EnvVar {
            name: secret.name.clone(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret_name.clone(),
                    key: secret.name.clone(),
                    optional: Some(false),
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    let ports = def
        .port_mappings
        .iter()
        .map(|p| ContainerPort {
            container_port: p.container_port as i32,
            host_port: p.host_port.map(|p| p as i32),
            name: p.name.clone(),
            protocol: p.protocol.clone(),
            ..Default::default()
        })
        .collect();

    let cpu = ov.and_then(|o| o.cpu).or(def.cpu).or_else(|| task_cpu.and_then(|c| c.parse().ok()));
    let memory = ov.and_then(|o| o.memory).or(def.memory);

    let resources = if cpu.is_some() || memory.is_some() || def.memory_reservation.is_some() {
        Some(ResourceRequirements {
            requests: Some(resource_map(def.memory_reservation.or(memory), cpu)),
            limits: Some(resource_map(memory, cpu)),
            ..Default::default()
        })
    } else {
        None
    };

    let probe = def.health_check.as_ref().map(|hc| Probe {
        exec: Some(ExecAction {
            command: Some(hc.command.clone()),
        }),
        period_seconds: Some(hc.interval_seconds as i32),
        timeout_seconds: Some(hc.timeout_seconds as i32),
        failure_threshold: Some(hc.retries as i32),
        initial_delay_seconds: hc.start_period_seconds.map(|s| s as i32),
        ..Default::default()
    });

    let volume_mounts = def
        .mount_points
        .iter()
        .map(|m| VolumeMount {
            name: m.source_volume.clone(),
            mount_path: m.container_path.clone(),
            read_only: Some(m.read_only),
            ..Default::default()
        })
        .collect();

    Container {
        name: def.name.clone(),
        image: Some(def.image.clone()),
        command: (!command.is_empty()).then_some(command),
        args: (!args.is_empty()).then_some(args),
        env: (!env.is_empty()).then_some(env),
        ports: (!ports.is_empty()).then_some(ports),
        resources,
        readiness_probe: probe.clone(),
        liveness_probe: probe,
        volume_mounts: (!volume_mounts.is_empty()).then_some(volume_mounts),
        ..Default::default()
    }
}

fn resource_map(memory: Option<u32>, cpu: Option<u32>) -> BTreeMap<String, Quantity> {
    let mut map = BTreeMap::new();
    if let Some(memory) = memory {
        map.insert("memory".to_string(), Quantity(format!("{memory}Mi")));
    }
    if let Some(cpu) = cpu {
        map.insert("cpu".to_string(), Quantity(format!("{cpu}m")));
    }
    map
}

fn build_volume(volume: &Volume) -> K8sVolume {
    K8sVolume {
        name: volume.name.clone(),
        empty_dir: matches!(volume.backing, VolumeBacking::EmptyDir)
            .then(Default::default),
        host_path: if matches!(volume.backing, VolumeBacking::HostPath) {
            volume.host_path.clone().map(|path| k8s_openapi::api::core::v1::HostPathVolumeSource {
                path,
                ..Default::default()
            })
        } else {
            None
        },
        ..Default::default()
    }
}

pub fn log_group_annotations(log_config: &LogConfiguration) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    if let Some(group) = log_config.awslogs_group() {
        annotations.insert("kecs.dev/awslogs-group".to_string(), group.to_string());
    }
    if let Some(prefix) = log_config.awslogs_stream_prefix() {
        annotations.insert("kecs.dev/awslogs-stream-prefix".to_string(), prefix.to_string());
    }
    annotations
}

#[cfg(test)]
mod tests {
    use kecs_types::{KeyValuePair, NetworkMode, TaskDefinitionStatus};

    use super::*;

    fn web_task_definition() -> TaskDefinition {
        TaskDefinition {
            arn: Arn::task_definition("us-east-1", "000000000000", "web", 3),
            family: "web".to_string(),
            revision: 3,
            status: TaskDefinitionStatus::Active,
            container_definitions: vec![ContainerDefinition {
                name: "app".to_string(),
                image: "nginx:latest".to_string(),
                command: vec!["serve".to_string()],
                entry_point: vec![],
                environment: vec![KeyValuePair {
                    name: "PORT".to_string(),
                    value: "8080".to_string(),
                }],
                secrets: vec![],
                port_mappings: vec![],
                essential: true,
                cpu: Some(256),
                memory: Some(512),
                memory_reservation: None,
                log_configuration: None,
                health_check: None,
                depends_on: vec![],
                mount_points: vec![],
            }],
            volumes: vec![],
            network_mode: NetworkMode::Awsvpc,
            cpu: Some("256".to_string()),
            memory: Some("512".to_string()),
            compatibilities: vec![],
            proxy_configuration: None,
            task_role_arn: None,
            execution_role_arn: None,
            registered_at: 0,
            deregistered_at: None,
        }
    }

    #[test]
    fn pod_name_and_namespace_follow_the_naming_scheme() {
        let pod = build_pod(&web_task_definition(), "default", "abc123", Some("web"), &RunTaskOverrides::default());
        assert_eq!(pod.metadata.name.as_deref(), Some("web-abc123"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some("kecs-default"));
    }

    #[test]
    fn command_override_replaces_entry_point_and_drops_base_args() {
        let overrides = RunTaskOverrides {
            container_overrides: vec![crate::overrides::ContainerOverride {
                name: "app".to_string(),
                command: Some(vec!["migrate".to_string()]),
                environment: None,
                cpu: None,
                memory: None,
            }],
        };
        let pod = build_pod(&web_task_definition(), "default", "abc123", Some("web"), &overrides);
        let container = &pod.spec.unwrap().containers[0];
        assert_eq!(container.command, Some(vec!["migrate".to_string()]));
        assert_eq!(container.args, None);
    }

    #[test]
    fn translation_is_pure() {
        let td = web_task_definition();
        let a = build_pod(&td, "default", "abc123", Some("web"), &RunTaskOverrides::default());
        let b = build_pod(&td, "default", "abc123", Some("web"), &RunTaskOverrides::default());
        assert_eq!(a.metadata.name, b.metadata.name);
        assert_eq!(
            serde_json::to_string(a.spec.as_ref().unwrap().containers.first()).unwrap_or_default(),
            serde_json::to_string(b.spec.as_ref().unwrap().containers.first()).unwrap_or_default(),
        );
    }
}
