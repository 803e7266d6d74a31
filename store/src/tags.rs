use std::collections::BTreeMap;

use crate::error::StoreResult;
use crate::{Store, keys};

impl Store {
    pub fn put_tags(&self, resource_arn: &str, tags: &BTreeMap<String, String>) -> StoreResult<()> {
        self.with_transaction(|txn| {
            for (key, value) in tags {
                txn.index.insert(keys::idx_tag(resource_arn, key), value.as_bytes())?;
            }
            Ok(())
        })
    }

    pub fn untag(&self, resource_arn: &str, keys_to_remove: &[String]) -> StoreResult<()> {
        self.with_transaction(|txn| {
            for key in keys_to_remove {
                txn.index.remove(keys::idx_tag(resource_arn, key))?;
            }
            Ok(())
        })
    }

    pub fn list_tags(&self, resource_arn: &str) -> StoreResult<BTreeMap<String, String>> {
        let prefix = keys::idx_tag_prefix(resource_arn);
        let mut tags = BTreeMap::new();
        for item in self.index.scan_prefix(&prefix) {
            let (k, v) = item?;
            let key = String::from_utf8_lossy(&k)
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            tags.insert(key, String::from_utf8_lossy(&v).into_owned());
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn tags_round_trip_and_can_be_removed() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let arn = "arn:aws:ecs:us-east-1:000000000000:cluster/default";
        let mut tags = BTreeMap::new();
        tags.insert("env".to_string(), "prod".to_string());
        tags.insert("team".to_string(), "platform".to_string());
        store.put_tags(arn, &tags).unwrap();
        assert_eq!(store.list_tags(arn).unwrap().len(), 2);
        store.untag(arn, &["env".to_string()]).unwrap();
        let remaining = store.list_tags(arn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.get("team"), Some(&"platform".to_string()));
    }
}
