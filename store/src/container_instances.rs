use kecs_types::ContainerInstance;

use crate::error::{StoreError, StoreResult};
use crate::{Store, keys};

impl Store {
    /// Called by the controller the first time a task lands on a previously
    /// unseen node; idempotent on `(clusterArn, nodeName)`.
    pub fn upsert_container_instance(&self, instance: ContainerInstance) -> StoreResult<ContainerInstance> {
        let idx_key = keys::idx_cluster_name(&instance.cluster_arn.to_string(), &instance.node_name);
        self.with_transaction(|txn| {
            if let Some(existing_arn) = txn.get_index(&idx_key)? {
                return self.get_container_instance_in_txn(txn, &existing_arn);
            }
            let arn = instance.arn.to_string();
            let bytes = serde_json::to_vec(&instance).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(&arn, &bytes)?;
            txn.put_index(&idx_key, &arn)?;
            Ok(instance.clone())
        })
    }

    fn get_container_instance_in_txn(
        &self,
        txn: &crate::txn::Txn,
        arn: &str,
    ) -> Result<ContainerInstance, sled::transaction::ConflictableTransactionError<StoreError>> {
        let bytes = txn
            .get(arn)?
            .ok_or_else(|| txn.fail(StoreError::NotFound(arn.to_string())))?;
        serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))
    }

    pub fn get_container_instance(&self, arn: &str) -> StoreResult<ContainerInstance> {
        let bytes = self
            .main
            .get(keys::primary(arn))?
            .ok_or_else(|| StoreError::NotFound(arn.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn list_container_instances(&self, cluster_arn: &str) -> StoreResult<Vec<ContainerInstance>> {
        let prefix = format!("idx/cluster_name/{cluster_arn}/").into_bytes();
        let mut rows = Vec::new();
        for item in self.index.scan_prefix(&prefix) {
            let (_, v) = item?;
            let arn = String::from_utf8_lossy(&v).into_owned();
            rows.push(self.get_container_instance(&arn)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use kecs_types::{Arn, ContainerInstanceStatus};
    use tempfile::tempdir;

    use super::*;

    fn new_instance(cluster_arn: Arn, node: &str) -> ContainerInstance {
        ContainerInstance {
            arn: Arn::container_instance("us-east-1", "000000000000", cluster_arn.short_name(), node),
            cluster_arn,
            ec2_instance_id: None,
            node_name: node.to_string(),
            status: ContainerInstanceStatus::Active,
            running_tasks_count: 0,
            pending_tasks_count: 0,
            registered_at: 0,
        }
    }

    #[test]
    fn upsert_is_idempotent_per_node() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let cluster = Arn::cluster("us-east-1", "000000000000", "default");
        let first = store.upsert_container_instance(new_instance(cluster.clone(), "node-1")).unwrap();
        let second = store.upsert_container_instance(new_instance(cluster, "node-1")).unwrap();
        assert_eq!(first.arn, second.arn);
        let all = store.list_container_instances(&first.cluster_arn.to_string()).unwrap();
        assert_eq!(all.len(), 1);
    }
}
