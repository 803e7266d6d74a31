use kecs_types::TaskSet;

use crate::error::{StoreError, StoreResult};
use crate::{Store, keys};

impl Store {
    pub fn create_task_set(&self, task_set: TaskSet) -> StoreResult<TaskSet> {
        let arn = task_set.arn.to_string();
        self.with_transaction(|txn| {
            let bytes = serde_json::to_vec(&task_set).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(&arn, &bytes)?;
            txn.put_index(
                &keys::idx_cluster_name(&task_set.service_arn.to_string(), &task_set.id),
                &arn,
            )?;
            Ok(task_set.clone())
        })
    }

    pub fn get_task_set(&self, arn: &str) -> StoreResult<TaskSet> {
        let bytes = self
            .main
            .get(keys::primary(arn))?
            .ok_or_else(|| StoreError::NotFound(arn.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn list_task_sets_by_service(&self, service_arn: &str) -> StoreResult<Vec<TaskSet>> {
        let prefix = format!("idx/cluster_name/{service_arn}/").into_bytes();
        let mut rows = Vec::new();
        for item in self.index.scan_prefix(&prefix) {
            let (_, v) = item?;
            let arn = String::from_utf8_lossy(&v).into_owned();
            rows.push(self.get_task_set(&arn)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use kecs_types::{Arn, StabilityStatus, TaskSetStatus};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn lists_task_sets_scoped_to_service() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let service = Arn::service("us-east-1", "000000000000", "default", "web");
        let task_set = TaskSet {
            id: "ecs-svc/1".to_string(),
            arn: Arn::task_set("us-east-1", "000000000000", "default", "ecs-svc/1"),
            service_arn: service.clone(),
            task_definition_arn: Arn::task_definition("us-east-1", "000000000000", "web", 1),
            scale_percent: 100.0,
            status: TaskSetStatus::Primary,
            computed_desired_count: 2,
            stability_status: StabilityStatus::Steady,
        };
        store.create_task_set(task_set).unwrap();
        let sets = store.list_task_sets_by_service(&service.to_string()).unwrap();
        assert_eq!(sets.len(), 1);
    }
}
