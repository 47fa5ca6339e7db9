use super::{Storage, StorageError, StorageKey};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const CART_PREFIX: &str = "cart-";

/// One file per key under a root directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a reader
/// never sees a half-written record. Concurrent writers to the same key race and the
/// last rename wins.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) the storage directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::io(root.display(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &StorageKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    fn file_names(&self) -> Result<Vec<String>, StorageError> {
        let io = |e: std::io::Error| StorageError::io(self.root.display(), e);
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io)? {
            if let Some(name) = entry.map_err(io)?.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn write(&self, key: &StorageKey, value: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        let staging = path.with_extension("tmp");
        fs::write(&staging, value).map_err(|e| StorageError::io(key, e))?;
        fs::rename(&staging, &path).map_err(|e| StorageError::io(key, e))?;
        debug!(%key, bytes = value.len(), "Record written");
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn keys(&self) -> Result<Vec<StorageKey>, StorageError> {
        let mut keys = Vec::new();
        for name in self.file_names()? {
            if let Some(key) = StorageKey::from_file_name(&name) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Removes every `cart-` file, including names that no longer decode to a key and
    /// staging files left behind by an interrupted write.
    fn clear_carts(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for name in self.file_names()? {
            if !name.starts_with(CART_PREFIX) {
                continue;
            }
            match fs::remove_file(self.root.join(&name)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(name, e)),
            }
        }
        debug!(removed, "Cart files removed");
        Ok(removed)
    }
}
