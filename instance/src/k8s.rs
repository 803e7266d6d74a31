use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, Namespace, PodSpec, PodTemplateSpec, Service as K8sService,
    ServiceAccount, ServicePort, ServiceSpec,
};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Client;
use kube::api::{Api, PostParams};

use crate::error::Result;

pub const SYSTEM_NAMESPACE: &str = "kecs-system";

/// Creates `resource`, treating an existing object (HTTP 409) as success —
/// bring-up is idempotent, matching a resumed `start` against a live cluster.
pub async fn ensure<K>(api: &Api<K>, resource: &K) -> Result<()>
where
    K: kube::Resource<DynamicType = ()> + Clone + std::fmt::Debug + serde::Serialize + serde::de::DeserializeOwned,
{
    match api.create(&PostParams::default(), resource).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn ensure_namespace(client: Client, name: &str) -> Result<()> {
    let api: Api<Namespace> = Api::all(client);
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    match api.create(&PostParams::default(), &ns).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn labels(app: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), app.to_string())])
}

pub fn control_plane_service_account() -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta {
            name: Some("kecs-control-plane".to_string()),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Cluster-wide read/write on the resources the reconciler and translator
/// touch; scoped to exactly the kinds named in the external interface.
pub fn control_plane_cluster_role() -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some("kecs-control-plane".to_string()),
            ..Default::default()
        },
        rules: Some(vec![
            PolicyRule {
                api_groups: Some(vec!["".to_string()]),
                resources: Some(vec![
                    "pods".to_string(),
                    "services".to_string(),
                    "namespaces".to_string(),
                    "configmaps".to_string(),
                    "secrets".to_string(),
                    "serviceaccounts".to_string(),
                    "events".to_string(),
                ]),
                verbs: vec!["get", "list", "watch", "create", "update", "patch", "delete"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                ..Default::default()
            },
            PolicyRule {
                api_groups: Some(vec!["apps".to_string()]),
                resources: Some(vec!["deployments".to_string(), "replicasets".to_string()]),
                verbs: vec!["get", "list", "watch", "create", "update", "patch", "delete"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    }
}

pub fn control_plane_cluster_role_binding() -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some("kecs-control-plane".to_string()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: "kecs-control-plane".to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: "kecs-control-plane".to_string(),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            ..Default::default()
        }]),
    }
}

pub fn control_plane_config_map(instance: &str) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some("kecs-control-plane-config".to_string()),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([("KECS_INSTANCE".to_string(), instance.to_string())])),
        ..Default::default()
    }
}

pub fn control_plane_deployment(admin_port: u16) -> Deployment {
    let app = "kecs-control-plane";
    Deployment {
        metadata: ObjectMeta {
            name: Some(app.to_string()),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            labels: Some(labels(app)),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels(app)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels(app)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some("kecs-control-plane".to_string()),
                    containers: vec![Container {
                        name: "control-plane".to_string(),
                        image: Some("kecs:latest".to_string()),
                        env: Some(vec![k8s_openapi::api::core::v1::EnvVar {
                            name: "KECS_CONTAINER_MODE".to_string(),
                            value: Some("true".to_string()),
                            ..Default::default()
                        }]),
                        ports: Some(vec![
                            k8s_openapi::api::core::v1::ContainerPort {
                                container_port: 30080,
                                name: Some("api".to_string()),
                                ..Default::default()
                            },
                            k8s_openapi::api::core::v1::ContainerPort {
                                container_port: admin_port as i32,
                                name: Some("admin".to_string()),
                                ..Default::default()
                            },
                        ]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

pub fn control_plane_node_port_service(api_port: u16) -> K8sService {
    let app = "kecs-control-plane";
    K8sService {
        metadata: ObjectMeta {
            name: Some(app.to_string()),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("NodePort".to_string()),
            selector: Some(labels(app)),
            ports: Some(vec![ServicePort {
                name: Some("api".to_string()),
                port: 80,
                target_port: Some(IntOrString::Int(30080)),
                node_port: Some(api_port as i32),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn is_ready_deployment(deployment: &Deployment) -> bool {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .is_some_and(|r| r >= 1)
}
