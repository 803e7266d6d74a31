use kecs_types::Event;

use crate::error::StoreResult;
use crate::{Store, keys};

impl Store {
    /// Appends an audit row; never updates or deletes an existing one. The
    /// id is a tree-local auto-increment so iteration order matches
    /// insertion order.
    pub fn append_event(
        &self,
        resource_arn: &str,
        kind: &str,
        action: &str,
        timestamp: i64,
        payload: serde_json::Value,
        correlation_id: &str,
    ) -> StoreResult<Event> {
        let id = self.events.generate_id()?;
        let event = Event {
            id,
            resource_arn: resource_arn.to_string(),
            kind: kind.to_string(),
            action: action.to_string(),
            timestamp,
            payload,
            correlation_id: correlation_id.to_string(),
        };
        let bytes = serde_json::to_vec(&event)?;
        self.events.insert(keys::event_key(id), bytes)?;
        Ok(event)
    }

    pub fn list_events_for_resource(&self, resource_arn: &str, limit: usize) -> StoreResult<Vec<Event>> {
        let mut rows = Vec::new();
        for item in self.events.iter().rev() {
            let (_, bytes) = item?;
            let event: Event = serde_json::from_slice(&bytes)?;
            if event.resource_arn == resource_arn {
                rows.push(event);
                if rows.len() >= limit {
                    break;
                }
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn events_are_ordered_newest_first() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let arn = "arn:aws:ecs:us-east-1:000000000000:service/default/web";
        store
            .append_event(arn, "SERVICE", "DEPLOYMENT_IN_PROGRESS", 1, serde_json::json!({}), "req-1")
            .unwrap();
        store
            .append_event(arn, "SERVICE", "DEPLOYMENT_COMPLETED", 2, serde_json::json!({}), "req-2")
            .unwrap();
        let events = store.list_events_for_resource(arn, 10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, "DEPLOYMENT_COMPLETED");
    }

    #[test]
    fn events_for_other_resources_are_excluded() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store
            .append_event("arn:a", "SERVICE", "X", 1, serde_json::json!({}), "req")
            .unwrap();
        let events = store.list_events_for_resource("arn:b", 10).unwrap();
        assert!(events.is_empty());
    }
}
