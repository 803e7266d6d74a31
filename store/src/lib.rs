use std::path::Path;
use std::time::Duration;

mod cache;
mod clusters;
mod container_instances;
pub mod error;
mod events;
pub mod keys;
mod pagination;
mod services;
mod tags;
mod task_definitions;
mod task_sets;
mod tasks;
mod txn;

use cache::Cache;
pub use error::{StoreError, StoreResult};
pub use pagination::{DEFAULT_MAX_RESULTS, MAX_MAX_RESULTS, clamp_max_results};
pub use txn::Txn;

const CACHE_CAPACITY: usize = 4096;
const CACHE_TTL: Duration = Duration::from_secs(30);

/// Bumped whenever a released version changes the on-disk key encoding.
/// There has only ever been one encoding so far, so `migrate` has nothing to
/// run yet — it exists so the next bump has somewhere to put its step.
const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Embedded, transactional store keyed by ARN, backed by `sled`. Two trees
/// hold committed state (`main` for entity rows, `index` for secondary
/// indexes); a third, append-only tree holds audit events. An in-process
/// LRU+TTL cache sits in front of point reads and is purged on every write.
pub struct Store {
    db: sled::Db,
    main: sled::Tree,
    index: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
    cache: Cache,
}

impl Store {
    /// Opens (creating if absent) the store rooted at `path`. sled validates
    /// its own on-disk format at open time; any corruption surfaces here as
    /// `StoreError::Corrupt` so the process fails fast instead of serving
    /// reads off a partially-recovered tree. A schema-version row in the
    /// `meta` tree is checked before anything else opens: a version newer
    /// than this binary understands means a downgrade, which is refused.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = sled::Config::new()
            .path(path.as_ref())
            .open()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let main = db.open_tree("main")?;
        let index = db.open_tree("index")?;
        let events = db.open_tree("events")?;
        let meta = db.open_tree("meta")?;
        Self::migrate(&meta)?;
        Ok(Store {
            db,
            main,
            index,
            events,
            meta,
            cache: Cache::new(CACHE_CAPACITY, CACHE_TTL),
        })
    }

    fn migrate(meta: &sled::Tree) -> StoreResult<()> {
        let on_disk = meta
            .get(SCHEMA_VERSION_KEY)?
            .map(|v| {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&v);
                u32::from_be_bytes(buf)
            })
            .unwrap_or(CURRENT_SCHEMA_VERSION);
        if on_disk > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::Corrupt(format!(
                "store schema version {on_disk} is newer than this binary's {CURRENT_SCHEMA_VERSION}; downgrades are not supported"
            )));
        }
        meta.insert(SCHEMA_VERSION_KEY, &CURRENT_SCHEMA_VERSION.to_be_bytes())?;
        Ok(())
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn open_creates_a_usable_store() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.flush().unwrap();
    }

    #[test]
    fn reopening_stamps_schema_version_once() {
        let dir = tempdir().unwrap();
        {
            Store::open(dir.path()).unwrap();
        }
        let store = Store::open(dir.path()).unwrap();
        let stamped = store.meta.get(SCHEMA_VERSION_KEY).unwrap().unwrap();
        assert_eq!(u32::from_be_bytes(stamped.as_ref().try_into().unwrap()), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn a_newer_on_disk_schema_version_is_refused() {
        let dir = tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store.meta.insert(SCHEMA_VERSION_KEY, &(CURRENT_SCHEMA_VERSION + 1).to_be_bytes()).unwrap();
        }
        assert!(matches!(Store::open(dir.path()), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn reopening_an_existing_path_preserves_data() {
        let dir = tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store
                .append_event("arn:a", "SERVICE", "CREATED", 1, serde_json::json!({}), "req")
                .unwrap();
        }
        let store = Store::open(dir.path()).unwrap();
        let events = store.list_events_for_resource("arn:a", 10).unwrap();
        assert_eq!(events.len(), 1);
    }
}
