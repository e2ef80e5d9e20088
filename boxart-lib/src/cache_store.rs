use crate::error::CacheError;
use std::io::ErrorKind;
use std::path::Path;

/// Byte store backing the box art cache.
pub trait CacheStore: Send + Sync {
    /// True when `path` holds a non-empty asset.
    fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;

    fn read(&self, path: &Path) -> impl Future<Output = Result<Vec<u8>, CacheError>> + Send;

    /// Stores `bytes` at `path`, replacing any previous asset.
    fn write(&self, path: &Path, bytes: &[u8])
    -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Stores assets as plain files.
#[derive(Debug, Clone, Default)]
pub struct FsCacheStore;

impl CacheStore for FsCacheStore {
    async fn exists(&self, path: &Path) -> bool {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata.is_file() && metadata.len() > 0,
            Err(_) => false,
        }
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, CacheError> {
        tokio::fs::read(path).await.map_err(|source| match source.kind() {
            ErrorKind::NotFound => CacheError::NotFound(path.to_path_buf()),
            _ => CacheError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let io_error = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, bytes).await.map_err(io_error)
    }
}
