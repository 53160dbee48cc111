use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{Cache, CacheError};

/// Root of all named stores for one application origin.
///
/// Opening the same name twice returns the same shared handle, so every
/// component sees one in-memory index per store.
pub struct CacheStorage {
    root: PathBuf,
    opened: Mutex<HashMap<String, Arc<Cache>>>,
}

impl CacheStorage {
    pub fn new(root: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;
        Ok(Self {
            root,
            opened: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open the named store, creating it if it does not exist yet.
    pub async fn open(&self, name: &str) -> Result<Arc<Cache>, CacheError> {
        let dir = self.store_dir(name)?;
        let mut opened = self.opened.lock().await;
        if let Some(cache) = opened.get(name) {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(Cache::load(name, dir)?);
        opened.insert(name.to_string(), Arc::clone(&cache));
        Ok(cache)
    }

    /// Open the named store only if it already exists.
    pub async fn get(&self, name: &str) -> Result<Option<Arc<Cache>>, CacheError> {
        if !self.has(name)? {
            return Ok(None);
        }
        self.open(name).await.map(Some)
    }

    pub fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.store_dir(name)?.is_dir())
    }

    /// Names of every store under the root, sorted.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.root, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| CacheError::io(entry.path(), e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if Self::validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn store_dir(&self, name: &str) -> Result<PathBuf, CacheError> {
        Self::validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Store names map straight onto directory names.
    fn validate_name(name: &str) -> Result<(), CacheError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', '\0']);
        if valid {
            Ok(())
        } else {
            Err(CacheError::InvalidName(name.to_string()))
        }
    }
}
