use kecs_types::{Task, TaskStatus};

use crate::error::{StoreError, StoreResult};
use crate::pagination::{clamp_max_results, decode, encode};
use crate::{Store, keys};

impl Store {
    /// `RunTask`/`StartTask` are not idempotent at the store layer; every
    /// call creates a new row keyed by the caller-supplied task ARN.
    pub fn create_task(&self, task: Task) -> StoreResult<Task> {
        let arn = task.arn.to_string();
        self.with_transaction(|txn| {
            let bytes = serde_json::to_vec(&task).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(&arn, &bytes)?;
            if let Some(service_arn) = &task.service_arn {
                txn.put_index(
                    &keys::idx_service_status(&service_arn.to_string(), status_str(task.last_status), &arn),
                    &arn,
                )?;
            }
            txn.put_index(
                &keys::idx_cluster_name(&task.cluster_arn.to_string(), &arn),
                &arn,
            )?;
            Ok(task.clone())
        })
    }

    pub fn get_task(&self, arn: &str) -> StoreResult<Task> {
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

    /// Moves `last_status` forward and maintains the `(serviceArn, status)`
    /// index; rejects backwards moves without mutating anything.
    pub fn advance_task_status(
        &self,
        arn: &str,
        expected_version: u64,
        next: TaskStatus,
    ) -> StoreResult<Task> {
        self.with_transaction(|txn| {
            let bytes = txn
                .get(arn)?
                .ok_or_else(|| txn.fail(StoreError::NotFound(arn.to_string())))?;
            let mut task: Task = serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))?;
            if task.version != expected_version {
                return Err(txn.fail(StoreError::ConcurrentModification {
                    expected: expected_version,
                    found: task.version,
                }));
            }
            let old_status = task.last_status;
            if !task.try_advance_last_status(next) {
                return Ok(task);
            }
            task.version += 1;
            if let Some(service_arn) = &task.service_arn {
                let service_arn = service_arn.to_string();
                txn.delete_index(&keys::idx_service_status(&service_arn, status_str(old_status), arn))?;
                txn.put_index(
                    &keys::idx_service_status(&service_arn, status_str(task.last_status), arn),
                    arn,
                )?;
            }
            let updated = serde_json::to_vec(&task).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(arn, &updated)?;
            Ok(task)
        })
    }

    /// Moves the task to `STOPPING` and persists `stoppedReason` in the same
    /// transaction, so a `DescribeTasks` issued right after sees both.
    pub fn stop_task(
        &self,
        arn: &str,
        expected_version: u64,
        reason: Option<String>,
    ) -> StoreResult<Task> {
        self.with_transaction(|txn| {
            let bytes = txn
                .get(arn)?
                .ok_or_else(|| txn.fail(StoreError::NotFound(arn.to_string())))?;
            let mut task: Task = serde_json::from_slice(&bytes).map_err(|e| txn.fail(StoreError::from(e)))?;
            if task.version != expected_version {
                return Err(txn.fail(StoreError::ConcurrentModification {
                    expected: expected_version,
                    found: task.version,
                }));
            }
            let old_status = task.last_status;
            task.stopped_reason = reason;
            if !task.try_advance_last_status(TaskStatus::Stopping) {
                task.version += 1;
                let updated = serde_json::to_vec(&task).map_err(|e| txn.fail(StoreError::from(e)))?;
                txn.put(arn, &updated)?;
                return Ok(task);
            }
            task.version += 1;
            if let Some(service_arn) = &task.service_arn {
                let service_arn = service_arn.to_string();
                txn.delete_index(&keys::idx_service_status(&service_arn, status_str(old_status), arn))?;
                txn.put_index(
                    &keys::idx_service_status(&service_arn, status_str(task.last_status), arn),
                    arn,
                )?;
            }
            let updated = serde_json::to_vec(&task).map_err(|e| txn.fail(StoreError::from(e)))?;
            txn.put(arn, &updated)?;
            Ok(task)
        })
    }

    pub fn list_tasks_by_cluster(
        &self,
        cluster_arn: &str,
        max_results: Option<u32>,
        next_token: Option<&str>,
    ) -> StoreResult<(Vec<Task>, Option<String>)> {
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
            if let Ok(task) = self.get_task(&arn) {
                rows.push(task);
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

    pub fn list_tasks_by_service_status(
        &self,
        service_arn: &str,
        status: TaskStatus,
    ) -> StoreResult<Vec<Task>> {
        let prefix = keys::idx_service_status_prefix(service_arn, status_str(status));
        let mut rows = Vec::new();
        for item in self.index.scan_prefix(&prefix) {
            let (_, v) = item?;
            let arn = String::from_utf8_lossy(&v).into_owned();
            if let Ok(task) = self.get_task(&arn) {
                rows.push(task);
            }
        }
        Ok(rows)
    }
}

fn status_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Provisioning => "PROVISIONING",
        TaskStatus::Pending => "PENDING",
        TaskStatus::Activating => "ACTIVATING",
        TaskStatus::Running => "RUNNING",
        TaskStatus::Deactivating => "DEACTIVATING",
        TaskStatus::Stopping => "STOPPING",
        TaskStatus::Deprovisioning => "DEPROVISIONING",
        TaskStatus::Stopped => "STOPPED",
    }
}

#[cfg(test)]
mod tests {
    use kecs_types::{Arn, Connectivity, Task, TaskStatus};
    use tempfile::tempdir;

    use super::*;

    fn test_store() -> Store {
        let dir = tempdir().unwrap();
        Store::open(dir.path()).unwrap()
    }

    fn new_task(cluster_arn: Arn, service_arn: Option<Arn>, id: &str) -> Task {
        Task {
            arn: Arn::task("us-east-1", "000000000000", cluster_arn.short_name(), id),
            cluster_arn,
            task_definition_arn: Arn::task_definition("us-east-1", "000000000000", "web", 1),
            service_arn,
            desired_status: TaskStatus::Running,
            last_status: TaskStatus::Provisioning,
            containers: vec![],
            cpu: None,
            memory: None,
            started_by: None,
            group: None,
            started_at: None,
            stopped_at: None,
            stopped_reason: None,
            connectivity: Connectivity::Connected,
            pod_name: None,
            namespace: None,
            version: 0,
        }
    }

    #[test]
    fn advance_moves_service_status_index() {
        let store = test_store();
        let cluster = Arn::cluster("us-east-1", "000000000000", "default");
        let service = Arn::service("us-east-1", "000000000000", "default", "web");
        let task = store
            .create_task(new_task(cluster, Some(service.clone()), "abc"))
            .unwrap();
        let arn = task.arn.to_string();
        store.advance_task_status(&arn, 0, TaskStatus::Pending).unwrap();
        store.advance_task_status(&arn, 1, TaskStatus::Running).unwrap();
        let running = store
            .list_tasks_by_service_status(&service.to_string(), TaskStatus::Running)
            .unwrap();
        assert_eq!(running.len(), 1);
        let pending = store
            .list_tasks_by_service_status(&service.to_string(), TaskStatus::Pending)
            .unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn backwards_move_is_rejected_as_a_no_op() {
        let store = test_store();
        let cluster = Arn::cluster("us-east-1", "000000000000", "default");
        let task = store.create_task(new_task(cluster, None, "abc")).unwrap();
        let arn = task.arn.to_string();
        store.advance_task_status(&arn, 0, TaskStatus::Running).unwrap();
        let unchanged = store.advance_task_status(&arn, 1, TaskStatus::Pending).unwrap();
        assert_eq!(unchanged.last_status, TaskStatus::Running);
    }
}
