use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the file backing one entry.
///
/// An `EntryName` is the 32-byte keyed digest of a logical key. Its textual
/// form is 64 lowercase hex characters, which is used verbatim as the file
/// name, so it can never contain a path separator or a `..` component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryName([u8; 32]);

impl EntryName {
    /// Length of the hex form in characters.
    pub const HEX_LEN: usize = 64;

    /// Create an `EntryName` from a pre-computed digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded file name.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryName({})", self.short_hex())
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
