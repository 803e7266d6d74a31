use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service as K8sService, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Client;
use kube::api::Api;

use crate::error::Result;
use crate::k8s::{self, SYSTEM_NAMESPACE};

const APP: &str = "kecs-gateway";

/// Traefik fronting LocalStack's edge port, exposed on the instance's
/// configured gateway NodePort (4566 by default).
pub async fn deploy(client: Client, gateway_port: u16) -> Result<()> {
    let labels = BTreeMap::from([("app".to_string(), APP.to_string())]);

    let deployment = Deployment {
        metadata: ObjectMeta {
            name: Some(APP.to_string()),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "traefik".to_string(),
                        image: Some("traefik:v3.0".to_string()),
                        args: Some(vec![
                            "--entrypoints.web.address=:4566".to_string(),
                            "--providers.kubernetesingress".to_string(),
                        ]),
                        ports: Some(vec![ContainerPort {
                            container_port: 4566,
                            name: Some("web".to_string()),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    };

    let service = K8sService {
        metadata: ObjectMeta {
            name: Some(APP.to_string()),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("NodePort".to_string()),
            selector: Some(labels),
            ports: Some(vec![ServicePort {
                name: Some("web".to_string()),
                port: 4566,
                target_port: Some(IntOrString::Int(4566)),
                node_port: Some(gateway_port as i32),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    };

    let deployment_api: Api<Deployment> = Api::namespaced(client.clone(), SYSTEM_NAMESPACE);
    k8s::ensure(&deployment_api, &deployment).await?;
    let service_api: Api<K8sService> = Api::namespaced(client, SYSTEM_NAMESPACE);
    k8s::ensure(&service_api, &service).await?;
    Ok(())
}
