//! Applies the `MutatingWebhookConfiguration` that routes pod creations in
//! opted-in namespaces to this webhook's `/mutate` endpoint.

use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, MutatingWebhookConfiguration, RuleWithOperations, ServiceReference,
    WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::api::{Api, PostParams};

use crate::error::{Error, Result};

pub const CONFIGURATION_NAME: &str = "kecs-aws-proxy-injector";
pub const SERVICE_NAME: &str = "kecs-webhook";
pub const SERVICE_NAMESPACE: &str = "kecs-system";
pub const NAMESPACE_SELECTOR_LABEL: &str = "kecs.io/localstack-enabled";

pub async fn ensure(client: &kube::Client, ca_bundle_base64: &str, service_port: i32) -> Result<()> {
    let api: Api<MutatingWebhookConfiguration> = Api::all(client.clone());

    let mut selector = std::collections::BTreeMap::new();
    selector.insert(NAMESPACE_SELECTOR_LABEL.to_string(), "true".to_string());

    let webhook = MutatingWebhook {
        name: "inject.kecs.dev".to_string(),
        admission_review_versions: vec!["v1".to_string()],
        side_effects: "NoneOnDryRun".to_string(),
        failure_policy: Some("Fail".to_string()),
        client_config: WebhookClientConfig {
            ca_bundle: Some(k8s_openapi::ByteString(
                base64::Engine::decode(&base64::engine::general_purpose::STANDARD, ca_bundle_base64)
                    .unwrap_or_default(),
            )),
            service: Some(ServiceReference {
                name: SERVICE_NAME.to_string(),
                namespace: SERVICE_NAMESPACE.to_string(),
                path: Some("/mutate".to_string()),
                port: Some(service_port),
            }),
            url: None,
        },
        rules: Some(vec![RuleWithOperations {
            api_groups: Some(vec!["".to_string()]),
            api_versions: Some(vec!["v1".to_string()]),
            operations: Some(vec!["CREATE".to_string()]),
            resources: Some(vec!["pods".to_string()]),
            scope: None,
        }]),
        namespace_selector: Some(LabelSelector {
            match_labels: Some(selector),
            ..Default::default()
        }),
        ..Default::default()
    };

    let configuration = MutatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(CONFIGURATION_NAME.to_string()),
            ..Default::default()
        },
        webhooks: Some(vec![webhook]),
    };

    match api.create(&PostParams::default(), &configuration).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            api.replace(CONFIGURATION_NAME, &PostParams::default(), &configuration)
                .await
                .map(|_| ())
                .map_err(Error::Kube)
        }
        Err(e) => Err(Error::Kube(e)),
    }
}
