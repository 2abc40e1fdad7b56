use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use fstore_crypto::KeyDeriver;
use fstore_types::{EntryName, Timestamp};
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::config::{StoreConfig, WriteStrategy};
use crate::envelope::{self, Decoded, Header, MAX_HEADER_LEN};
use crate::error::{StoreError, StoreResult};
use crate::traits::EntryStore;

/// Directory-backed entry store, one file per entry.
///
/// Each logical key maps to `<directory>/<hex HMAC-SHA256 of key>`. The file
/// holds the optional expiry marker followed by the payload (see
/// [`envelope`]). There is no index: the directory listing is the store.
///
/// The directory is checked once, when the store is opened. If it disappears
/// afterwards, writes fail with [`StoreError::Storage`] and reads miss.
pub struct FileStore {
    /// Canonical store directory.
    directory: PathBuf,
    /// Keyed with the secret derived from `directory`.
    deriver: KeyDeriver,
    write_strategy: WriteStrategy,
}

impl FileStore {
    /// Open `root/folder`, creating the folder when needed.
    ///
    /// `root` must already exist and be writable.
    pub fn open(root: impl AsRef<Path>, folder: &str) -> StoreResult<Self> {
        Self::from_config(&StoreConfig::new(root.as_ref(), folder))
    }

    /// Open a store directory directly. Its parent acts as the root.
    pub fn open_dir(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        let config = match (dir.parent(), dir.file_name()) {
            (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                StoreConfig::new(parent, name.to_string_lossy())
            }
            _ => StoreConfig::new(dir, ""),
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let root = &config.root;
        probe_writable(root).map_err(|source| StoreError::RootNotWritable {
            path: root.clone(),
            source,
        })?;

        let target = config.directory();
        if !target.is_dir() {
            create_directory(&target, config.dir_mode).map_err(|source| {
                StoreError::CreateDirectory {
                    path: target.clone(),
                    source,
                }
            })?;
        }

        let not_writable = |source| StoreError::DirectoryNotWritable {
            path: target.clone(),
            source,
        };
        probe_writable(&target).map_err(not_writable)?;
        let directory = fs::canonicalize(&target).map_err(not_writable)?;

        info!(
            directory = %directory.display(),
            strategy = ?config.write_strategy,
            "file store opened"
        );

        Ok(Self {
            deriver: KeyDeriver::for_directory(&directory),
            directory,
            write_strategy: config.write_strategy,
        })
    }

    /// Replace the write strategy.
    pub fn with_write_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.write_strategy = strategy;
        self
    }

    /// Canonical path of the store directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn write_strategy(&self) -> WriteStrategy {
        self.write_strategy
    }

    /// Derived file name for `key`.
    pub fn entry_name(&self, key: &str) -> EntryName {
        self.deriver.derive(key)
    }

    /// Full path of the file backing `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.path_of(&self.entry_name(key))
    }

    fn path_of(&self, name: &EntryName) -> PathBuf {
        self.directory.join(name.to_hex())
    }

    // ---------------------------------------------------------------
    // File primitives
    // ---------------------------------------------------------------

    /// Whole-file read. Every failure is a miss.
    fn read_entry(&self, path: &Path, name: &EntryName) -> Option<Vec<u8>> {
        match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(name = %name, error = %e, "unreadable entry treated as miss");
                None
            }
        }
    }

    /// Bounded read of the first line. Every failure is a miss.
    fn read_first_line(&self, path: &Path, name: &EntryName) -> Option<Vec<u8>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(name = %name, error = %e, "unopenable entry treated as miss");
                return None;
            }
        };

        let mut head = Vec::with_capacity(MAX_HEADER_LEN);
        let mut reader = BufReader::new(file.take(MAX_HEADER_LEN as u64));
        match reader.read_until(b'\n', &mut head) {
            Ok(_) => Some(head),
            Err(e) => {
                warn!(name = %name, error = %e, "unreadable entry treated as miss");
                None
            }
        }
    }

    fn write_entry(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        match self.write_strategy {
            WriteStrategy::Atomic => {
                let mut tmp = temp_builder().tempfile_in(&self.directory)?;
                tmp.write_all(bytes)?;
                tmp.as_file().sync_all()?;
                tmp.persist(path).map_err(|e| e.error)?;
            }
            WriteStrategy::Locked => {
                let mut file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(path)?;
                // Truncate only once the lock is held so a concurrent writer's
                // bytes are never interleaved with ours. Released on close.
                file.lock()?;
                file.set_len(0)?;
                file.write_all(bytes)?;
                file.sync_all()?;
            }
        }
        Ok(())
    }

    /// Remove a file if present. Returns `true` if it was removed.
    fn unlink(path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove entry file");
                false
            }
        }
    }

    fn expire(path: &Path, name: &EntryName) {
        if Self::unlink(path) {
            debug!(name = %name, "expired entry removed");
        }
    }

    /// A marker that cannot be parsed never becomes readable again.
    fn discard_malformed(path: &Path, name: &EntryName) {
        warn!(name = %name, "malformed expiry marker, entry removed");
        Self::unlink(path);
    }
}

impl EntryStore for FileStore {
    fn put(&self, key: &str, payload: &[u8], expire_at: Option<Timestamp>) -> StoreResult<()> {
        if payload.is_empty() {
            return Ok(());
        }

        let name = self.entry_name(key);
        let path = self.path_of(&name);
        let bytes = envelope::encode(payload, expire_at)?;

        self.write_entry(&path, &bytes)
            .map_err(|source| StoreError::Storage { path, source })?;

        debug!(
            name = %name,
            len = bytes.len(),
            expire_at = ?expire_at,
            "entry written"
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let name = self.entry_name(key);
        let path = self.path_of(&name);
        let bytes = self.read_entry(&path, &name)?;

        // A zero-length file is a locked write caught between truncate and
        // write; nothing stored is ever empty.
        if bytes.is_empty() {
            return None;
        }

        match envelope::decode(&bytes, Timestamp::now(), || Self::expire(&path, &name)) {
            Decoded::Live(payload) => Some(payload.to_vec()),
            Decoded::Expired => None,
            Decoded::Malformed => {
                Self::discard_malformed(&path, &name);
                None
            }
        }
    }

    fn contains(&self, key: &str) -> bool {
        let name = self.entry_name(key);
        let path = self.path_of(&name);
        let Some(head) = self.read_first_line(&path, &name) else {
            return false;
        };
        if head.is_empty() {
            return false;
        }

        match envelope::read_header(&head) {
            Header::Plain => true,
            Header::Expiring { expire_at, .. } => {
                if expire_at.is_expired_at(Timestamp::now()) {
                    Self::expire(&path, &name);
                    false
                } else {
                    true
                }
            }
            Header::Malformed => {
                Self::discard_malformed(&path, &name);
                false
            }
        }
    }

    fn remove(&self, key: &str) {
        let name = self.entry_name(key);
        if Self::unlink(&self.path_of(&name)) {
            debug!(name = %name, "entry removed");
        }
    }

    /// Removes every regular file directly inside the directory.
    ///
    /// Subdirectories are left alone, and so are dot-files, which is where
    /// in-flight atomic writes live.
    fn clear(&self) -> StoreResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.directory)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_file() && Self::unlink(&path) {
                removed += 1;
            }
        }

        debug!(removed, directory = %self.directory.display(), "store cleared");
        Ok(removed)
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("directory", &self.directory)
            .field("write_strategy", &self.write_strategy)
            .finish()
    }
}

/// Fails unless a file can be created in `dir`.
fn probe_writable(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("{} is not a directory", dir.display()),
        ));
    }
    tempfile::tempfile_in(dir).map(drop)
}

/// Temp files for atomic writes.
///
/// The `.tmp` prefix keeps them out of [`FileStore::clear`]. They are created
/// with the mode a plain `File::create` would use (`0o666` less the umask)
/// so that a persisted entry is as readable as a locked write's.
fn temp_builder() -> Builder<'static, 'static> {
    let mut builder = Builder::new();
    builder.prefix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

fn create_directory(dir: &Path, mode: u32) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(dir)
}
