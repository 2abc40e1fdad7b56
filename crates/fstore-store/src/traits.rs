use fstore_types::Timestamp;

use crate::error::StoreResult;

/// Byte-level key-value storage with optional per-entry expiry.
///
/// All implementations must satisfy these invariants:
/// - Keys are opaque strings; the empty string is a valid key.
/// - An empty payload is never stored: `put` with one is a no-op that leaves
///   any existing entry untouched.
/// - Expiry is lazy. An entry whose instant is strictly before the current
///   second is removed by the next `get` or `contains` that touches it.
/// - Reads fail open: absent, unreadable and expired entries are all misses.
/// - `remove` is idempotent and never fails.
pub trait EntryStore: Send + Sync {
    /// Store `payload` under `key`, replacing any previous entry.
    fn put(&self, key: &str, payload: &[u8], expire_at: Option<Timestamp>) -> StoreResult<()>;

    /// Fetch the payload stored under `key`, or `None` on a miss.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Returns `true` if `get` would currently return a payload.
    fn contains(&self, key: &str) -> bool;

    /// Remove the entry for `key` if there is one.
    fn remove(&self, key: &str);

    /// Remove every entry. Returns how many were removed.
    fn clear(&self) -> StoreResult<usize>;
}
