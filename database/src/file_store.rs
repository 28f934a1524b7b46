use crate::blob::{validate_key, BlobStore};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use watcher_core::StorageError;

/// One JSON file per key below a root directory.
///
/// Writes go to a temporary file in the target directory which is then
/// renamed over the old file, so a crash never leaves a half-written blob.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

fn write_atomically(path: &Path, value: &str) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(value.as_bytes())?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn save_blob(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let value = value.to_string();
        let target = path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&target, &value))
            .await
            .map_err(|e| StorageError::Backend {
                message: format!("write task for {} failed: {}", key, e),
            })?
            .map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })?;

        debug!("Saved blob {} to {}", key, path.display());
        Ok(())
    }

    async fn load_blob(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}
