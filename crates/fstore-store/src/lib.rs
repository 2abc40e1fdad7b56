//! Filesystem-backed key-value storage with inline expiration.
//!
//! Each entry is one file in a single flat directory. The file name is the
//! hex HMAC-SHA256 of the caller's key, keyed by a secret derived from the
//! directory path, so names are stable, traversal-free and scoped to their
//! directory. An optional `#^e:<unix seconds>\n` first line carries the
//! entry's expiration instant; the rest of the file is the serialized value.
//!
//! # Storage Backends
//!
//! All backends implement the [`EntryStore`] trait:
//!
//! - [`FileStore`] -- one file per entry in a directory
//! - [`InMemoryStore`] -- `HashMap`-based store for tests and embedding
//!
//! [`Store`] puts a [`ValueCodec`] ([`JsonCodec`] by default, or
//! [`BincodeCodec`]) in front of a backend to read and write typed values.
//!
//! # Design Rules
//!
//! 1. The directory is the index; nothing is cached in memory.
//! 2. Expiry is lazy: an entry past its instant is deleted by the next read
//!    or existence check that touches it, never by a background sweep.
//! 3. Reads fail open. Missing, unreadable and expired entries are misses.
//!    Only a present, live entry that cannot be decoded is an error.
//! 4. Empty values are never persisted.
//! 5. Writes replace the whole file, atomically by default.

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use codec::{is_empty_value, BincodeCodec, CodecError, JsonCodec, ValueCodec};
pub use config::{StoreConfig, WriteStrategy};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use fstore_types::{EntryName, Timestamp};
pub use memory::InMemoryStore;
pub use store::Store;
pub use traits::EntryStore;
