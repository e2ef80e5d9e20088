use crate::cache_store::CacheStore;
use crate::error::CacheError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory cache. Clones share their contents.
#[derive(Clone, Default)]
pub struct MockCacheStore {
    entries: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    failing_writes: HashSet<PathBuf>,
}

impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes_to(mut self, path: &Path) -> Self {
        self.failing_writes.insert(path.to_path_buf());
        self
    }

    pub fn insert(&self, path: &Path, bytes: &[u8]) {
        self.entries
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bytes.to_vec());
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(path).cloned()
    }
}

impl CacheStore for MockCacheStore {
    async fn exists(&self, path: &Path) -> bool {
        self.get(path).is_some_and(|bytes| !bytes.is_empty())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, CacheError> {
        self.get(path)
            .ok_or_else(|| CacheError::NotFound(path.to_path_buf()))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        if self.failing_writes.contains(path) {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.insert(path, bytes);
        Ok(())
    }
}
