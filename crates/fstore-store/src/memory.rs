use std::collections::HashMap;
use std::sync::RwLock;

use fstore_types::Timestamp;

use crate::error::StoreResult;
use crate::traits::EntryStore;

#[derive(Clone)]
struct MemEntry {
    payload: Vec<u8>,
    expire_at: Option<Timestamp>,
}

impl MemEntry {
    fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expire_at.is_some_and(|at| at.is_expired_at(now))
    }
}

/// In-memory, HashMap-based entry store.
///
/// Intended for tests and embedding. Follows the same lazy-expiration rules
/// as [`FileStore`](crate::FileStore); there is no envelope because expiry is
/// kept next to the payload rather than inside it.
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, MemEntry>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries held, expired-but-unvisited ones included.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Drop `key` if it is still expired at `now`.
    fn evict(&self, key: &str, now: Timestamp) {
        let mut map = self.entries.write().expect("lock poisoned");
        if map.get(key).is_some_and(|e| e.is_expired_at(now)) {
            map.remove(key);
        }
    }

    /// Look up a live entry, evicting it when expired.
    fn live<R>(&self, key: &str, f: impl FnOnce(&MemEntry) -> R) -> Option<R> {
        let now = Timestamp::now();
        {
            let map = self.entries.read().expect("lock poisoned");
            match map.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => return Some(f(entry)),
                Some(_) => {}
            }
        }
        self.evict(key, now);
        None
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore for InMemoryStore {
    fn put(&self, key: &str, payload: &[u8], expire_at: Option<Timestamp>) -> StoreResult<()> {
        if payload.is_empty() {
            return Ok(());
        }
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(
            key.to_string(),
            MemEntry {
                payload: payload.to_vec(),
                expire_at,
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.live(key, |entry| entry.payload.clone())
    }

    fn contains(&self, key: &str) -> bool {
        self.live(key, |_| ()).is_some()
    }

    fn remove(&self, key: &str) {
        self.entries.write().expect("lock poisoned").remove(key);
    }

    fn clear(&self) -> StoreResult<usize> {
        let mut map = self.entries.write().expect("lock poisoned");
        let removed = map.len();
        map.clear();
        Ok(removed)
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
