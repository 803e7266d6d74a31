use kecs_types::{Service, ServiceStatus};

use crate::error::{StoreError, StoreResult};
use crate::pagination::{clamp_max_results, decode, encode};
use crate::{Store, keys};

impl Store {
    /// Idempotent on `(cluster, name)`: recreating an ACTIVE service is a
    /// no-op that returns the existing row.
    pub fn create_service(&self, service: Service) -> StoreResult<Service> {
        let idx_key = keys::idx_cluster_name(&service.cluster_arn.to_string(), &service.name);
        self.with_transaction(|txn| {
            if let Some(existing_arn) = txn.get_index(&idx_key)? {
                if let Some(bytes) = txn.get(&existing_arn)? {
                    let existing: Service = serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))?;
                    if matches!(existing.status, ServiceStatus::Active) {
                        return Ok(existing);
                    }
                }
            }
            let arn = service.arn.to_string();
            let bytes = serde_json::to_vec(&service).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(&arn, &bytes)?;
            txn.put_index(&idx_key, &arn)?;
            Ok(service.clone())
        })
    }

    pub fn get_service(&self, arn: &str) -> StoreResult<Service> {
        if let Some(cached) = self.cache.get(keys::primary(arn).as_slice()) {
            return Ok(serde_json::from_slice(&cached)?);
        }
        let bytes = self
            .main
            .get(keys::primary(arn))?
            .ok_or_else(|| StoreError::NotFound(arn.to_string()))?;
        self.cache.put(keys::primary(arn), bytes.to_vec());
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn get_service_by_name(&self, cluster_arn: &str, name: &str) -> StoreResult<Service> {
        let idx_key = keys::idx_cluster_name(cluster_arn, name);
        let arn = self
            .index
            .get(&idx_key)?
            .map(|ivec| String::from_utf8_lossy(&ivec).into_owned())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        self.get_service(&arn)
    }

    pub fn update_service_cas(
        &self,
        arn: &str,
        expected_version: u64,
        mutate: impl Fn(&mut Service) + Send + Sync,
    ) -> StoreResult<Service> {
        self.with_transaction(|txn| {
            let bytes = txn
                .get(arn)?
                .ok_or_else(|| txn.fail(StoreError::NotFound(arn.to_string())))?;
            let mut service: Service = serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))?;
            if service.version != expected_version {
                return Err(txn.fail(StoreError::ConcurrentModification {
                    expected: expected_version,
                    found: service.version,
                }));
            }
            mutate(&mut service);
            service.version += 1;
            let updated = serde_json::to_vec(&service).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(arn, &updated)?;
            Ok(service)
        })
    }

    pub fn list_services(
        &self,
        cluster_arn: &str,
        max_results: Option<u32>,
        next_token: Option<&str>,
    ) -> StoreResult<(Vec<Service>, Option<String>)> {
        let limit = clamp_max_results(max_results) as usize;
        let prefix = format!("idx/cluster_name/{cluster_arn}/").into_bytes();
        let start: Vec<u8> = match next_token {
            Some(t) => {
                let mut key = decode(t)?.into_bytes();
                key.push(0);
                key
            }
            None => prefix.clone(),
        };
        let mut rows = Vec::new();
        let mut last_key = None;
        for item in self.index.range(start..).take(limit + 1) {
            let (k, v) = item?;
            if !k.starts_with(&prefix) {
                break;
            }
            let arn = String::from_utf8_lossy(&v).into_owned();
            last_key = Some(String::from_utf8_lossy(&k).into_owned());
            if let Ok(service) = self.get_service(&arn) {
                rows.push(service);
            }
        }
        let next = if rows.len() > limit {
            rows.truncate(limit);
            last_key.map(|k| encode(&k))
        } else {
            None
        };
        Ok((rows, next))
    }
}

#[cfg(test)]
mod tests {
    use kecs_types::{Arn, DeploymentConfiguration, LaunchType, SchedulingStrategy, Service, ServiceStatus};
    use tempfile::tempdir;

    use super::*;

    fn test_store() -> Store {
        let dir = tempdir().unwrap();
        Store::open(dir.path()).unwrap()
    }

    fn new_service(cluster_arn: Arn, name: &str) -> Service {
        Service {
            arn: Arn::service("us-east-1", "000000000000", cluster_arn.short_name(), name),
            name: name.to_string(),
            cluster_arn,
            task_definition_arn: Arn::task_definition("us-east-1", "000000000000", "web", 1),
            desired_count: 1,
            running_count: 0,
            pending_count: 0,
            launch_type: LaunchType::Fargate,
            deployment_config: DeploymentConfiguration::default(),
            network_config: Default::default(),
            load_balancers: vec![],
            events: vec![],
            scheduling_strategy: SchedulingStrategy::Replica,
            deployment_controller: kecs_types::DeploymentControllerType::Ecs,
            status: ServiceStatus::Active,
            version: 0,
        }
    }

    #[test]
    fn create_is_idempotent_while_active() {
        let store = test_store();
        let cluster_arn = Arn::cluster("us-east-1", "000000000000", "default");
        let first = store.create_service(new_service(cluster_arn.clone(), "web")).unwrap();
        let second = store.create_service(new_service(cluster_arn, "web")).unwrap();
        assert_eq!(first.arn, second.arn);
    }

    #[test]
    fn list_services_scopes_to_cluster() {
        let store = test_store();
        let cluster_a = Arn::cluster("us-east-1", "000000000000", "a");
        let cluster_b = Arn::cluster("us-east-1", "000000000000", "b");
        store.create_service(new_service(cluster_a.clone(), "web")).unwrap();
        store.create_service(new_service(cluster_b, "web")).unwrap();
        let (rows, _) = store.list_services(&cluster_a.to_string(), None, None).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
