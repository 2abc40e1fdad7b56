use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// How an entry file is replaced on write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// Write a temp file in the store directory, fsync it, then rename it over
    /// the entry. Readers see either the old or the new content.
    #[default]
    Atomic,
    /// Truncate and rewrite the entry in place under an exclusive advisory
    /// lock. Concurrent writers are serialized; readers may see a partial file.
    Locked,
}

/// Configuration for a [`FileStore`](crate::FileStore).
///
/// ```toml
/// root = "/var/cache/app"
/// folder = "sessions"
/// write_strategy = "atomic"
/// dir_mode = 0o770
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Existing, writable parent directory.
    pub root: PathBuf,
    /// Store directory below `root`, created on open when missing.
    pub folder: String,
    pub write_strategy: WriteStrategy,
    /// Permission bits for a newly created store directory (unix only).
    pub dir_mode: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir(),
            folder: "fstore".to_string(),
            write_strategy: WriteStrategy::default(),
            dir_mode: 0o770,
        }
    }
}

impl StoreConfig {
    /// Config for `root/folder` with every other setting at its default.
    pub fn new(root: impl Into<PathBuf>, folder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            folder: folder.into(),
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The store directory: `root` joined with `folder`, leading separators
    /// of `folder` ignored.
    pub fn directory(&self) -> PathBuf {
        let folder = self.folder.trim_start_matches(['/', '\\']);
        if folder.is_empty() {
            self.root.clone()
        } else {
            self.root.join(folder)
        }
    }
}
