use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PodSpec, PodTemplateSpec, Service as K8sService, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Client;
use kube::api::Api;

use crate::error::{Error, Result};
use crate::k8s::{self, SYSTEM_NAMESPACE};

/// The design-default service set per the spec's open LocalStack question;
/// overridable by config.
pub const DEFAULT_ENABLED_SERVICES: &[&str] = &["s3", "iam", "logs", "ssm", "secretsmanager", "elbv2"];

const APP: &str = "kecs-localstack";

pub async fn deploy(client: Client, enabled_services: &[String]) -> Result<()> {
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
                        name: "localstack".to_string(),
                        image: Some("localstack/localstack:latest".to_string()),
                        env: Some(vec![EnvVar {
                            name: "SERVICES".to_string(),
                            value: Some(enabled_services.join(",")),
                            ..Default::default()
                        }]),
                        ports: Some(vec![k8s_openapi::api::core::v1::ContainerPort {
                            container_port: 4566,
                            name: Some("edge".to_string()),
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
            selector: Some(labels),
            ports: Some(vec![ServicePort {
                name: Some("edge".to_string()),
                port: 4566,
                target_port: Some(IntOrString::Int(4566)),
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

/// Polls `_localstack/health` (reached through the gateway's NodePort) until
/// every requested service reports `"available"`.
pub async fn wait_healthy(health_url: &str, enabled_services: &[String], timeout: Duration) -> Result<()> {
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(resp) = client.get(health_url).send().await
            && let Ok(body) = resp.json::<serde_json::Value>().await
        {
            let services = body.get("services").cloned().unwrap_or_default();
            let all_available = enabled_services
                .iter()
                .all(|s| services.get(s).and_then(|v| v.as_str()) == Some("available"));
            if all_available {
                return Ok(());
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::Timeout(timeout, "LocalStack health"));
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}
