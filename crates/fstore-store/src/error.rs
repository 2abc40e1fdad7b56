use std::io;
use std::path::PathBuf;

use crate::codec::CodecError;

/// Errors from store operations.
///
/// A miss (absent, unreadable or expired entry) is never an error; reads
/// report it as `None` and existence checks as `false`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The parent directory handed to the store cannot be written to.
    #[error("path not writable: {}", path.display())]
    RootNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store directory did not exist and could not be created.
    #[error("directory not created: {}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store directory exists but cannot be written to.
    #[error("directory not writable: {}", path.display())]
    DirectoryNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing an entry file failed. The entry is left as it was before the
    /// write under the atomic strategy, and undefined under the locked one.
    #[error("failed to write entry {}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The value could not be turned into bytes.
    #[error("serialization error")]
    Serialization(#[source] CodecError),

    /// A present, unexpired entry holds bytes the codec cannot decode.
    #[error("deserialization error")]
    Deserialization(#[source] CodecError),

    /// A payload written without expiry starts with the expiry marker tag and
    /// would be misread as an expiring entry.
    #[error("payload begins with the expiry marker tag")]
    SentinelCollision,

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error outside of entry writes (configuration loading, directory
    /// listing).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Returns `true` for the errors raised while opening a store.
    ///
    /// These are fatal for whatever owns the store; nothing is retried.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::RootNotWritable { .. }
                | Self::CreateDirectory { .. }
                | Self::DirectoryNotWritable { .. }
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
