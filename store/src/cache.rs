use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// Read-through cache in front of the `main` tree. Entries expire after
/// `ttl` and the whole cache is purged on any write made through the same
/// `Store` handle, since a write may invalidate rows this process doesn't
/// know are related (e.g. a CAS failure retried by another handle).
pub struct Cache {
    inner: Mutex<LruCache<Vec<u8>, Entry>>,
    ttl: Duration,
}

impl Cache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let mut guard = self.inner.lock().unwrap();
        match guard.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.bytes.clone()),
            Some(_) => {
                guard.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: Vec<u8>, bytes: Vec<u8>) {
        let mut guard = self.inner.lock().unwrap();
        guard.put(
            key,
            Entry {
                bytes,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &[u8]) {
        self.inner.lock().unwrap().pop(key);
    }

    /// Purged whenever a transaction commits a write, per the store contract.
    pub fn purge(&self) {
        self.inner.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = Cache::new(10, Duration::from_millis(1));
        cache.put(b"k".to_vec(), b"v".to_vec());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(b"k"), None);
    }

    #[test]
    fn purge_clears_every_entry() {
        let cache = Cache::new(10, Duration::from_secs(60));
        cache.put(b"a".to_vec(), b"1".to_vec());
        cache.put(b"b".to_vec(), b"2".to_vec());
        cache.purge();
        assert_eq!(cache.get(b"a"), None);
        assert_eq!(cache.get(b"b"), None);
    }
}
