use kecs_types::Cluster;

use crate::error::{StoreError, StoreResult};
use crate::pagination::{clamp_max_results, decode, encode};
use crate::{Store, keys};

impl Store {
    /// Idempotent on name: if a cluster with this name already exists and is
    /// ACTIVE, returns it unchanged instead of creating a duplicate.
    pub fn create_cluster(&self, cluster: Cluster) -> StoreResult<Cluster> {
        let arn = cluster.arn.to_string();
        self.with_transaction(|txn| {
            let idx_key = keys::idx_list("cluster", &cluster.name);
            if let Some(existing_arn) = txn.get_index(&idx_key)? {
                if let Some(bytes) = txn.get(&existing_arn)? {
                    let existing: Cluster =
                        serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))?;
                    return Ok(existing);
                }
            }
            let bytes = serde_json::to_vec(&cluster).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(&arn, &bytes)?;
            txn.put_index(&idx_key, &arn)?;
            Ok(cluster.clone())
        })
    }

    pub fn get_cluster(&self, arn: &str) -> StoreResult<Cluster> {
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

    pub fn get_cluster_by_name(&self, name: &str) -> StoreResult<Cluster> {
        let idx_key = keys::idx_list("cluster", name);
        let arn = self
            .index
            .get(&idx_key)?
            .map(|ivec| String::from_utf8_lossy(&ivec).into_owned())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        self.get_cluster(&arn)
    }

    pub fn update_cluster_cas(
        &self,
        arn: &str,
        expected_version: u64,
        mutate: impl Fn(&mut Cluster) + Send + Sync,
    ) -> StoreResult<Cluster> {
        self.with_transaction(|txn| {
            let bytes = txn.get(arn)?.ok_or_else(|| {
                txn.fail(StoreError::NotFound(arn.to_string()))
            })?;
            let mut cluster: Cluster = serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))?;
            if cluster.version != expected_version {
                return Err(txn.fail(StoreError::ConcurrentModification {
                    expected: expected_version,
                    found: cluster.version,
                }));
            }
            mutate(&mut cluster);
            cluster.version += 1;
            let updated = serde_json::to_vec(&cluster).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(arn, &updated)?;
            Ok(cluster)
        })
    }

    pub fn delete_cluster(&self, arn: &str, name: &str) -> StoreResult<()> {
        self.with_transaction(|txn| {
            txn.delete(arn)?;
            txn.delete_index(&keys::idx_list("cluster", name))?;
            Ok(())
        })
    }

    pub fn list_clusters(
        &self,
        max_results: Option<u32>,
        next_token: Option<&str>,
    ) -> StoreResult<(Vec<Cluster>, Option<String>)> {
        let limit = clamp_max_results(max_results) as usize;
        let prefix = keys::idx_cluster_prefix("cluster");
        let start: Vec<u8> = match next_token {
            Some(t) => {
                let mut key = decode(t)?.into_bytes();
                key.push(0); // resume strictly after the last key of the previous page
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
            rows.push(self.get_cluster(&arn)?);
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
    use kecs_types::{Arn, Cluster};
    use tempfile::tempdir;

    use super::*;

    fn test_store() -> Store {
        let dir = tempdir().unwrap();
        Store::open(dir.path()).unwrap()
    }

    fn new_cluster(name: &str) -> Cluster {
        Cluster::new(
            Arn::cluster("us-east-1", "000000000000", name),
            name.to_string(),
            format!("kecs-{name}"),
            0,
        )
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = test_store();
        let cluster = new_cluster("demo");
        let created = store.create_cluster(cluster.clone()).unwrap();
        let fetched = store.get_cluster(&created.arn.to_string()).unwrap();
        assert_eq!(fetched.name, "demo");
    }

    #[test]
    fn create_is_idempotent_on_name() {
        let store = test_store();
        let first = store.create_cluster(new_cluster("demo")).unwrap();
        let second = store.create_cluster(new_cluster("demo")).unwrap();
        assert_eq!(first.arn, second.arn);
        let (all, _) = store.list_clusters(None, None).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn cas_update_rejects_stale_version() {
        let store = test_store();
        let created = store.create_cluster(new_cluster("demo")).unwrap();
        let arn = created.arn.to_string();
        store
            .update_cluster_cas(&arn, 0, |c| c.counters.running_tasks_count = 1)
            .unwrap();
        let err = store
            .update_cluster_cas(&arn, 0, |c| c.counters.running_tasks_count = 2)
            .unwrap_err();
        assert!(matches!(err, StoreError::ConcurrentModification { .. }));
    }

    #[test]
    fn get_missing_cluster_is_not_found() {
        let store = test_store();
        assert!(matches!(
            store.get_cluster("arn:aws:ecs:us-east-1:000000000000:cluster/missing"),
            Err(StoreError::NotFound(_))
        ));
    }
}
