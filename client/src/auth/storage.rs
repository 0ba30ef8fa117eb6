//! Key/value persistence for the session blob.
//!
//! [`SessionStorage`] is the seam the auth context writes through. Browsers
//! back it with local storage; native clients use [`FileStorage`], and tests
//! use [`MemoryStorage`].

use crate::errors::{AuthError, AuthResult};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Synchronous string key/value store.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> AuthResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AuthResult<()>;
    /// Removing a missing key succeeds.
    fn remove(&self, key: &str) -> AuthResult<()>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Arc<T> {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        (**self).remove(key)
    }
}

/// In-process storage, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(key: &str) -> AuthError {
    AuthError::storage(key, "memory storage lock poisoned")
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned(key))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned(key))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned(key))?;
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> AuthResult<PathBuf> {
        let is_plain = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !is_plain {
            return Err(AuthError::validation(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::storage(key, format!("read {}: {}", path.display(), e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| AuthError::storage(key, format!("create {}: {}", self.dir.display(), e)))?;

        // Write beside the target and rename so readers never see a torn blob
        let tmp = path.with_extension("json.tmp");
        let written = fs::write(&tmp, value)
            .map_err(|e| AuthError::storage(key, format!("write {}: {}", tmp.display(), e)))
            .and_then(|()| {
                fs::rename(&tmp, &path).map_err(|e| {
                    AuthError::storage(key, format!("rename {}: {}", path.display(), e))
                })
            });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        debug!(key, path = %path.display(), "session storage written");
        Ok(())
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::storage(key, format!("remove {}: {}", path.display(), e))),
        }
    }
}
