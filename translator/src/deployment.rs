use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy, RollingUpdateDeployment};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kecs_types::{Service, TaskDefinition};

use crate::naming;
use crate::pod::build_pod_template;

pub const SERVICE_ARN_ANNOTATION: &str = "kecs.dev/service-arn";

/// Translates an ECS service, at its current desired count and deployment
/// configuration, into the `Deployment` that drives it. Called again on
/// every desired-count or task-definition change; the caller is
/// responsible for applying (not replacing) the result.
pub fn build_deployment(service: &Service, task_definition: &TaskDefinition, cluster_name: &str) -> Deployment {
    let namespace = naming::namespace(cluster_name);
    let name = naming::deployment_name(&service.name);

    let mut labels = BTreeMap::new();
    labels.insert("ecs-cluster".to_string(), cluster_name.to_string());
    labels.insert("ecs-service".to_string(), service.name.clone());
    labels.insert("app".to_string(), service.name.clone());

    let mut annotations = BTreeMap::new();
    annotations.insert(SERVICE_ARN_ANNOTATION.to_string(), service.arn.to_string());

    let selector = LabelSelector {
        match_labels: Some(labels.clone()),
        ..Default::default()
    };

    let template = build_pod_template(task_definition, cluster_name, &service.name);

    Deployment {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(namespace),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(service.desired_count as i32),
            selector,
            template,
            strategy: Some(rolling_update_strategy(service)),
            ..Default::default()
        }),
        status: None,
    }
}

/// ECS's `minimumHealthyPercent`/`maximumPercent` map onto Kubernetes'
/// `maxUnavailable`/`maxSurge`, both expressed as percentages of
/// `desiredCount` rather than absolute counts so they scale with it.
fn rolling_update_strategy(service: &Service) -> DeploymentStrategy {
    let max_unavailable = 100u32.saturating_sub(service.deployment_config.minimum_healthy_percent);
    let max_surge = service
        .deployment_config
        .maximum_percent
        .saturating_sub(100);
    DeploymentStrategy {
        type_: Some("RollingUpdate".to_string()),
        rolling_update: Some(RollingUpdateDeployment {
            max_unavailable: Some(IntOrString::String(format!("{max_unavailable}%"))),
            max_surge: Some(IntOrString::String(format!("{max_surge}%"))),
        }),
    }
}

#[cfg(test)]
mod tests {
    use kecs_types::{
        Arn, DeploymentConfiguration, LaunchType, NetworkConfiguration, SchedulingStrategy,
        ServiceStatus,
    };

    use super::*;

    fn web_service() -> Service {
        Service {
            arn: Arn::service("us-east-1", "000000000000", "default", "web"),
            name: "web".to_string(),
            cluster_arn: Arn::cluster("us-east-1", "000000000000", "default"),
            task_definition_arn: Arn::task_definition("us-east-1", "000000000000", "web", 1),
            desired_count: 3,
            running_count: 3,
            pending_count: 0,
            launch_type: LaunchType::Fargate,
            deployment_config: DeploymentConfiguration::default(),
            network_config: NetworkConfiguration::default(),
            load_balancers: vec![],
            events: vec![],
            scheduling_strategy: SchedulingStrategy::Replica,
            deployment_controller: kecs_types::DeploymentControllerType::Ecs,
            status: ServiceStatus::Active,
            version: 0,
        }
    }

    fn web_task_definition() -> TaskDefinition {
        TaskDefinition {
            arn: Arn::task_definition("us-east-1", "000000000000", "web", 1),
            family: "web".to_string(),
            revision: 1,
            status: kecs_types::TaskDefinitionStatus::Active,
            container_definitions: vec![],
            volumes: vec![],
            network_mode: kecs_types::NetworkMode::Awsvpc,
            cpu: None,
            memory: None,
            compatibilities: vec![],
            proxy_configuration: None,
            task_role_arn: None,
            execution_role_arn: None,
            registered_at: 0,
            deregistered_at: None,
        }
    }

    #[test]
    fn replicas_follow_desired_count() {
        let deployment = build_deployment(&web_service(), &web_task_definition(), "default");
        assert_eq!(deployment.spec.unwrap().replicas, Some(3));
    }

    #[test]
    fn default_deployment_config_maps_to_zero_surge_and_unavailable() {
        let deployment = build_deployment(&web_service(), &web_task_definition(), "default");
        let strategy = deployment.spec.unwrap().strategy.unwrap();
        let rolling_update = strategy.rolling_update.unwrap();
        assert_eq!(rolling_update.max_unavailable, Some(IntOrString::String("0%".to_string())));
        assert_eq!(rolling_update.max_surge, Some(IntOrString::String("100%".to_string())));
    }

    #[test]
    fn selector_matches_template_labels() {
        let deployment = build_deployment(&web_service(), &web_task_definition(), "default");
        let spec = deployment.spec.unwrap();
        let selector_labels = spec.selector.match_labels.unwrap();
        let template_labels = spec.template.metadata.unwrap().labels.unwrap();
        for (k, v) in &selector_labels {
            assert_eq!(template_labels.get(k), Some(v));
        }
    }
}
