use std::path::Path;
use std::time::Duration;

use fstore_types::Timestamp;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::codec::{is_empty_value, JsonCodec, ValueCodec};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::file::FileStore;
use crate::traits::EntryStore;

/// Typed key-value store: a value codec in front of an [`EntryStore`].
///
/// `Store::open` gives the usual setup, JSON values in a [`FileStore`].
///
/// ```no_run
/// use fstore_store::Store;
///
/// let store = Store::open("/var/cache/app", "sessions")?;
/// store.write("user:42", &vec!["a", "b"], None)?;
/// let tags: Option<Vec<String>> = store.read("user:42")?;
/// assert_eq!(tags.unwrap(), ["a", "b"]);
///
/// store.write_for("otp:42", "123456", std::time::Duration::from_secs(300))?;
/// assert!(store.has("otp:42"));
/// # Ok::<(), fstore_store::StoreError>(())
/// ```
#[derive(Debug)]
pub struct Store<B = FileStore, C = JsonCodec> {
    backend: B,
    codec: C,
}

impl Store<FileStore, JsonCodec> {
    /// Open a JSON store in `root/folder`. See [`FileStore::open`].
    pub fn open(root: impl AsRef<Path>, folder: &str) -> StoreResult<Self> {
        Ok(Self::new(FileStore::open(root, folder)?, JsonCodec))
    }

    /// Open a JSON store from configuration.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self::new(FileStore::from_config(config)?, JsonCodec))
    }
}

impl<B: EntryStore, C: ValueCodec> Store<B, C> {
    pub fn new(backend: B, codec: C) -> Self {
        Self { backend, codec }
    }

    /// Persist `value` under `key`, optionally expiring at `expire_at`.
    ///
    /// Empty values (see [`is_empty_value`]) are not persisted, and an
    /// existing entry for `key` is left untouched.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        expire_at: Option<Timestamp>,
    ) -> StoreResult<()> {
        if is_empty_value(value) {
            debug!(codec = self.codec.name(), "empty value not persisted");
            return Ok(());
        }
        let bytes = self
            .codec
            .encode(value)
            .map_err(StoreError::Serialization)?;
        self.backend.put(key, &bytes, expire_at)
    }

    /// [`write`](Self::write) with an expiry `ttl` from now.
    pub fn write_for<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> StoreResult<()> {
        self.write(key, value, Some(Timestamp::after(ttl)))
    }

    /// Load the value stored under `key`.
    ///
    /// Absent, unreadable and expired entries give `Ok(None)`. Bytes that the
    /// codec cannot decode give [`StoreError::Deserialization`].
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(bytes) = self.backend.get(key) else {
            return Ok(None);
        };
        self.codec
            .decode(&bytes)
            .map(Some)
            .map_err(StoreError::Deserialization)
    }

    /// Returns `true` if an unexpired entry exists for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.backend.contains(key)
    }

    /// Remove the entry for `key`. Never fails.
    pub fn delete(&self, key: &str) {
        self.backend.remove(key)
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> StoreResult<usize> {
        self.backend.clear()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn into_inner(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BincodeCodec;
    use crate::memory::InMemoryStore;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::error::Error as _;
    use std::fs;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
    }

    fn profile() -> Profile {
        Profile { name: "a".into() }
    }

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), "cache").unwrap();
        (dir, store)
    }

    fn now_plus(secs: i64) -> Timestamp {
        Timestamp::from_unix(Timestamp::now().as_unix() + secs)
    }

    #[test]
    fn user_profile_scenario() {
        let (_dir, store) = temp_store();
        store.write("user:42", &profile(), None).unwrap();

        let back: Profile = store.read("user:42").unwrap().unwrap();
        assert_eq!(back, profile());

        let file = store.backend().entry_path("user:42");
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, store.backend().entry_name("user:42").to_hex());
        assert_eq!(name.len(), 64);
        assert_eq!(fs::read(&file).unwrap(), br#"{"name":"a"}"#);
    }

    #[test]
    fn roundtrip_with_future_expiry() {
        let (_dir, store) = temp_store();
        store.write("k", &profile(), Some(now_plus(3600))).unwrap();
        assert_eq!(store.read::<Profile>("k").unwrap().unwrap(), profile());
        assert!(store.has("k"));
    }

    #[test]
    fn write_for_sets_expiry_marker() {
        let (_dir, store) = temp_store();
        store.write_for("k", &42u32, Duration::from_secs(60)).unwrap();
        let raw = fs::read(store.backend().entry_path("k")).unwrap();
        assert!(raw.starts_with(b"#^e:"));
        assert_eq!(store.read::<u32>("k").unwrap(), Some(42));
    }

    #[test]
    fn expired_read_is_none_and_removes_file() {
        let (_dir, store) = temp_store();
        store.write("k", &profile(), Some(now_plus(-1))).unwrap();
        assert!(store.read::<Profile>("k").unwrap().is_none());
        assert!(!store.backend().entry_path("k").exists());
        assert!(!store.has("k"));
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn empty_values_are_not_written() {
        let (_dir, store) = temp_store();
        store.write("s", "", None).unwrap();
        store.write("v", &Vec::<u32>::new(), None).unwrap();
        store.write("m", &BTreeMap::<String, u32>::new(), None).unwrap();
        store.write("n", &None::<u32>, None).unwrap();
        for key in ["s", "v", "m", "n"] {
            assert!(store.read::<serde_json::Value>(key).unwrap().is_none());
            assert!(!store.has(key));
        }
        assert_eq!(fs::read_dir(store.backend().directory()).unwrap().count(), 0);
    }

    #[test]
    fn empty_value_keeps_existing_entry() {
        let (_dir, store) = temp_store();
        store.write("k", "kept", None).unwrap();
        store.write("k", "", None).unwrap();
        assert_eq!(store.read::<String>("k").unwrap().unwrap(), "kept");
    }

    #[test]
    fn zero_and_false_are_values() {
        let (_dir, store) = temp_store();
        store.write("zero", &0u8, None).unwrap();
        store.write("no", &false, None).unwrap();
        assert_eq!(store.read::<u8>("zero").unwrap(), Some(0));
        assert_eq!(store.read::<bool>("no").unwrap(), Some(false));
    }

    #[test]
    fn has_agrees_with_read() {
        let (_dir, store) = temp_store();
        // Both calls may expire an entry, so each sees a fresh copy.
        let seed = |store: &Store| {
            store.write("live", &1u32, None).unwrap();
            store.write("ttl", &2u32, Some(now_plus(3600))).unwrap();
            store.write("dead", &3u32, Some(now_plus(-10))).unwrap();
        };

        for key in ["live", "ttl", "dead", "never"] {
            seed(&store);
            let has = store.has(key);
            seed(&store);
            let read = store.read::<u32>(key).unwrap();
            assert_eq!(has, read.is_some(), "{key}");
        }
    }

    #[test]
    fn corrupt_entry_is_deserialization_error() {
        let (_dir, store) = temp_store();
        fs::write(store.backend().entry_path("k"), b"{not json").unwrap();
        assert!(store.has("k"));
        let err = store.read::<Profile>("k").unwrap_err();
        assert!(matches!(err, StoreError::Deserialization(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn unreadable_entry_reads_as_none() {
        let (_dir, store) = temp_store();
        fs::create_dir(store.backend().entry_path("k")).unwrap();
        assert!(matches!(store.read::<Profile>("k"), Ok(None)));
        assert!(!store.has("k"));
    }

    #[test]
    fn non_finite_floats_are_empty() {
        let (_dir, store) = temp_store();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            store.write("f", &value, None).unwrap();
            assert!(!store.has("f"));
        }
        store.write("f", &1.5f64, None).unwrap();
        assert_eq!(store.read::<f64>("f").unwrap(), Some(1.5));
    }

    #[test]
    fn wrong_type_is_deserialization_error() {
        let (_dir, store) = temp_store();
        store.write("k", "text", None).unwrap();
        let err = store.read::<Profile>("k").unwrap_err();
        assert!(matches!(err, StoreError::Deserialization(_)));
    }

    #[test]
    fn unserializable_value_is_serialization_error() {
        let store = Store::new(InMemoryStore::new(), BincodeCodec);
        // bincode cannot size a sequence whose length is unknown up front.
        struct Unsized;
        impl Serialize for Unsized {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                use serde::ser::SerializeSeq;
                let mut seq = s.serialize_seq(None)?;
                seq.serialize_element(&1u8)?;
                seq.end()
            }
        }
        let err = store.write("k", &Unsized, None).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn delete_never_written_is_silent() {
        let (_dir, store) = temp_store();
        store.delete("ghost");
        assert_eq!(fs::read_dir(store.backend().directory()).unwrap().count(), 0);
    }

    #[test]
    fn delete_then_read_misses() {
        let (_dir, store) = temp_store();
        store.write("k", &profile(), None).unwrap();
        store.delete("k");
        assert!(store.read::<Profile>("k").unwrap().is_none());
    }

    #[test]
    fn clear_removes_every_entry() {
        let (_dir, store) = temp_store();
        let keys: Vec<String> = (0..10).map(|i| format!("key-{i}")).collect();
        for (i, key) in keys.iter().enumerate() {
            let expiry = (i % 2 == 0).then(|| now_plus(3600));
            store.write(key, &i, expiry).unwrap();
        }
        assert_eq!(store.clear().unwrap(), 10);
        for key in &keys {
            assert!(!store.has(key));
        }
        assert_eq!(fs::read_dir(store.backend().directory()).unwrap().count(), 0);
    }

    #[test]
    fn bincode_over_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(FileStore::open(dir.path(), "bin").unwrap(), BincodeCodec);
        store.write("k", &profile(), Some(now_plus(60))).unwrap();
        assert_eq!(store.read::<Profile>("k").unwrap().unwrap(), profile());
    }

    #[test]
    fn bincode_collision_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(FileStore::open(dir.path(), "bin").unwrap(), BincodeCodec);
        // Little-endian u32 whose bytes spell the marker tag.
        let sneaky = u32::from_le_bytes(*b"#^e:");
        let err = store.write("k", &sneaky, None).unwrap_err();
        assert!(matches!(err, StoreError::SentinelCollision));
        // The same value is fine once framed with an expiry.
        store.write("k", &sneaky, Some(now_plus(60))).unwrap();
        assert_eq!(store.read::<u32>("k").unwrap(), Some(sneaky));
    }

    #[test]
    fn in_memory_backend() {
        let store = Store::new(InMemoryStore::new(), JsonCodec);
        store.write("k", &profile(), None).unwrap();
        assert!(store.has("k"));
        assert_eq!(store.read::<Profile>("k").unwrap().unwrap(), profile());
        store.delete("k");
        assert!(!store.has("k"));
    }

    #[test]
    fn stores_in_different_directories_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a = Store::open(dir.path(), "a").unwrap();
        let b = Store::open(dir.path(), "b").unwrap();
        a.write("user:42", &profile(), None).unwrap();
        assert!(!b.has("user:42"));
        assert_ne!(
            a.backend().entry_name("user:42"),
            b.backend().entry_name("user:42")
        );
    }

    #[test]
    fn reopened_store_sees_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        Store::open(dir.path(), "cache")
            .unwrap()
            .write("k", &profile(), None)
            .unwrap();
        let reopened = Store::from_config(&StoreConfig::new(dir.path(), "cache")).unwrap();
        assert_eq!(reopened.read::<Profile>("k").unwrap().unwrap(), profile());
    }
}
