use std::fmt;
use std::path::Path;

use fstore_types::EntryName;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Domain tag mixed into the directory digest.
const DIRECTORY_DOMAIN: &str = "fstore-dir-v1";

/// Directory identity secret.
///
/// A domain-separated BLAKE3 digest of the store directory's path. It is
/// computed once when a store is opened and used as the HMAC key for every
/// entry name in that directory.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryKey([u8; 32]);

impl DirectoryKey {
    /// Derive the secret for a directory path.
    ///
    /// The path is hashed as given; callers pass a canonical absolute path so
    /// that different spellings of one directory share a namespace.
    pub fn derive(dir: &Path) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DIRECTORY_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(dir.as_os_str().as_encoded_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Wrap raw key material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for DirectoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DirectoryKey(..)")
    }
}

/// Maps logical keys to entry names for one directory.
#[derive(Clone, Debug)]
pub struct KeyDeriver {
    key: DirectoryKey,
}

impl KeyDeriver {
    pub fn new(key: DirectoryKey) -> Self {
        Self { key }
    }

    /// Shorthand for `KeyDeriver::new(DirectoryKey::derive(dir))`.
    pub fn for_directory(dir: &Path) -> Self {
        Self::new(DirectoryKey::derive(dir))
    }

    /// HMAC-SHA256 of `logical_key` under the directory secret.
    ///
    /// Total over all strings, the empty string included.
    pub fn derive(&self, logical_key: &str) -> EntryName {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.key.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(logical_key.as_bytes());
        let tag = mac.finalize().into_bytes();

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&tag);
        EntryName::from_digest(digest)
    }

    pub fn directory_key(&self) -> &DirectoryKey {
        &self.key
    }
}
