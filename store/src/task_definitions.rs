use kecs_types::{TaskDefinition, TaskDefinitionStatus};

use crate::error::{StoreError, StoreResult};
use crate::pagination::{clamp_max_results, decode, encode};
use crate::{Store, keys};

impl Store {
    /// Always creates a new revision; `task_definition.revision` (and the
    /// revision segment of its ARN) are ignored and replaced with one past
    /// the family's current highest revision, so two registrations of the
    /// same family never collide on ARN (invariant e).
    pub fn register_task_definition(&self, mut task_definition: TaskDefinition) -> StoreResult<TaskDefinition> {
        let family = task_definition.family.clone();
        self.with_transaction(|txn| {
            let highest = self
                .highest_revision(&family)
                .map_err(|e| txn.fail(e))?;
            task_definition.revision = highest + 1;
            task_definition.arn = kecs_types::Arn::task_definition(
                task_definition.arn.region(),
                task_definition.arn.account(),
                &family,
                task_definition.revision,
            );
            let arn = task_definition.arn.to_string();
            let bytes = serde_json::to_vec(&task_definition).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(&arn, &bytes)?;
            txn.put_index(
                &keys::idx_family_revision(&family, task_definition.revision),
                &arn,
            )?;
            txn.put_index(&keys::idx_list("family", &family), &family)?;
            Ok(task_definition.clone())
        })
    }

    /// Reads the index outside the enclosing transaction; sled transactions
    /// only arbitrate point writes, not range scans, so two concurrent
    /// `register_task_definition` calls for the same family can race to the
    /// same revision number. Acceptable for a single-writer embedded store.
    fn highest_revision(&self, family: &str) -> StoreResult<u32> {
        let prefix = keys::idx_family_prefix(family);
        let mut highest = 0u32;
        for item in self.index.scan_prefix(&prefix) {
            let (k, _) = item?;
            if let Some(rev_str) = String::from_utf8_lossy(&k).rsplit('/').next() {
                if let Ok(rev) = rev_str.parse::<u32>() {
                    highest = highest.max(rev);
                }
            }
        }
        Ok(highest)
    }

    pub fn get_task_definition(&self, arn: &str) -> StoreResult<TaskDefinition> {
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

    pub fn get_task_definition_by_family_revision(
        &self,
        family: &str,
        revision: u32,
    ) -> StoreResult<TaskDefinition> {
        let idx_key = keys::idx_family_revision(family, revision);
        let arn = self
            .index
            .get(&idx_key)?
            .map(|ivec| String::from_utf8_lossy(&ivec).into_owned())
            .ok_or_else(|| StoreError::NotFound(format!("{family}:{revision}")))?;
        self.get_task_definition(&arn)
    }

    pub fn latest_active_task_definition(&self, family: &str) -> StoreResult<TaskDefinition> {
        let highest = self.highest_revision(family)?;
        if highest == 0 {
            return Err(StoreError::NotFound(family.to_string()));
        }
        for revision in (1..=highest).rev() {
            if let Ok(td) = self.get_task_definition_by_family_revision(family, revision) {
                if matches!(td.status, TaskDefinitionStatus::Active) {
                    return Ok(td);
                }
            }
        }
        Err(StoreError::NotFound(family.to_string()))
    }

    pub fn deregister_task_definition(&self, arn: &str) -> StoreResult<TaskDefinition> {
        self.with_transaction(|txn| {
            let bytes = txn
                .get(arn)?
                .ok_or_else(|| txn.fail(StoreError::NotFound(arn.to_string())))?;
            let mut td: TaskDefinition = serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))?;
            td.status = TaskDefinitionStatus::Inactive;
            let updated = serde_json::to_vec(&td).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(arn, &updated)?;
            Ok(td)
        })
    }

    /// Lists task definition ARNs newest-revision-first within each family,
    /// optionally scoped to a single `family` and/or an ACTIVE/INACTIVE
    /// `status` filter applied after the index scan.
    pub fn list_task_definitions(
        &self,
        family: Option<&str>,
        status: Option<TaskDefinitionStatus>,
        max_results: Option<u32>,
        next_token: Option<&str>,
    ) -> StoreResult<(Vec<String>, Option<String>)> {
        let limit = clamp_max_results(max_results) as usize;
        let prefix = match family {
            Some(f) => keys::idx_family_prefix(f),
            None => keys::idx_family_revision_root(),
        };
        let start: Vec<u8> = match next_token {
            Some(t) => {
                let mut key = decode(t)?.into_bytes();
                key.push(0);
                key
            }
            None => prefix.clone(),
        };
        let mut arns = Vec::new();
        let mut last_key = None;
        for item in self.index.range(start..) {
            let (k, v) = item?;
            if !k.starts_with(&prefix) {
                break;
            }
            let arn = String::from_utf8_lossy(&v).into_owned();
            let keep = match status {
                Some(wanted) => self
                    .get_task_definition(&arn)
                    .map(|td| td.status == wanted)
                    .unwrap_or(false),
                None => true,
            };
            if keep {
                last_key = Some(String::from_utf8_lossy(&k).into_owned());
                arns.push(arn);
                if arns.len() > limit {
                    break;
                }
            }
        }
        let next = if arns.len() > limit {
            arns.truncate(limit);
            last_key.map(|k| encode(&k))
        } else {
            None
        };
        Ok((arns, next))
    }

    /// Lists distinct family names that have at least one registered revision.
    pub fn list_task_definition_families(
        &self,
        max_results: Option<u32>,
        next_token: Option<&str>,
    ) -> StoreResult<(Vec<String>, Option<String>)> {
        let limit = clamp_max_results(max_results) as usize;
        let prefix = keys::idx_cluster_prefix("family");
        let start: Vec<u8> = match next_token {
            Some(t) => {
                let mut key = decode(t)?.into_bytes();
                key.push(0);
                key
            }
            None => prefix.clone(),
        };
        let mut families = Vec::new();
        let mut last_key = None;
        for item in self.index.range(start..).take(limit + 1) {
            let (k, v) = item?;
            if !k.starts_with(&prefix) {
                break;
            }
            last_key = Some(String::from_utf8_lossy(&k).into_owned());
            families.push(String::from_utf8_lossy(&v).into_owned());
        }
        let next = if families.len() > limit {
            families.truncate(limit);
            last_key.map(|k| encode(&k))
        } else {
            None
        };
        Ok((families, next))
    }
}

#[cfg(test)]
mod tests {
    use kecs_types::{Arn, ContainerDefinition, NetworkMode, TaskDefinitionStatus};
    use tempfile::tempdir;

    use super::*;

    fn test_store() -> Store {
        let dir = tempdir().unwrap();
        Store::open(dir.path()).unwrap()
    }

    fn minimal_container(name: &str, image: &str) -> ContainerDefinition {
        ContainerDefinition {
            name: name.to_string(),
            image: image.to_string(),
            command: vec![],
            entry_point: vec![],
            environment: vec![],
            secrets: vec![],
            port_mappings: vec![],
            essential: true,
            cpu: None,
            memory: None,
            memory_reservation: None,
            log_configuration: None,
            health_check: None,
            depends_on: vec![],
            mount_points: vec![],
        }
    }

    fn draft(family: &str) -> TaskDefinition {
        TaskDefinition {
            arn: Arn::task_definition("us-east-1", "000000000000", family, 0),
            family: family.to_string(),
            revision: 0,
            status: TaskDefinitionStatus::Active,
            container_definitions: vec![minimal_container("app", "nginx:latest")],
            volumes: vec![],
            network_mode: NetworkMode::Awsvpc,
            cpu: Some("256".into()),
            memory: Some("512".into()),
            compatibilities: vec![],
            proxy_configuration: None,
            task_role_arn: None,
            execution_role_arn: None,
            registered_at: 0,
            deregistered_at: None,
        }
    }

    #[test]
    fn registering_twice_bumps_revision() {
        let store = test_store();
        let first = store.register_task_definition(draft("web")).unwrap();
        let second = store.register_task_definition(draft("web")).unwrap();
        assert_eq!(first.revision, 1);
        assert_eq!(second.revision, 2);
    }

    #[test]
    fn latest_active_skips_deregistered_revisions() {
        let store = test_store();
        let first = store.register_task_definition(draft("web")).unwrap();
        store.register_task_definition(draft("web")).unwrap();
        store
            .deregister_task_definition(&store.get_task_definition_by_family_revision("web", 2).unwrap().arn.to_string())
            .unwrap();
        let latest = store.latest_active_task_definition("web").unwrap();
        assert_eq!(latest.revision, first.revision);
    }

    #[test]
    fn families_are_listed_once_per_family() {
        let store = test_store();
        store.register_task_definition(draft("web")).unwrap();
        store.register_task_definition(draft("web")).unwrap();
        store.register_task_definition(draft("worker")).unwrap();
        let (families, _) = store.list_task_definition_families(None, None).unwrap();
        assert_eq!(families.len(), 2);
    }

    #[test]
    fn list_task_definitions_scoped_to_one_family() {
        let store = test_store();
        store.register_task_definition(draft("web")).unwrap();
        store.register_task_definition(draft("web")).unwrap();
        store.register_task_definition(draft("worker")).unwrap();
        let (arns, _) = store.list_task_definitions(Some("web"), None, None, None).unwrap();
        assert_eq!(arns.len(), 2);
    }

    #[test]
    fn list_task_definitions_filters_by_status() {
        let store = test_store();
        store.register_task_definition(draft("web")).unwrap();
        let second = store.register_task_definition(draft("web")).unwrap();
        store.deregister_task_definition(&second.arn.to_string()).unwrap();
        let (active, _) = store
            .list_task_definitions(Some("web"), Some(TaskDefinitionStatus::Active), None, None)
            .unwrap();
        assert_eq!(active.len(), 1);
    }
}
