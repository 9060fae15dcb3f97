use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{validate_key, ObjectStore, StorageError, StoredObject};

/// Filesystem-backed bucket rooted at `<root>/<bucket>`.
/// The content type is kept in a `.meta` sidecar next to the object.
#[derive(Clone)]
pub struct LocalObjectStore {
    bucket: String,
    base_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl AsRef<Path>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        Self {
            base_path: root.as_ref().join(&bucket),
            bucket,
        }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut meta = path.as_os_str().to_owned();
        meta.push(".meta");
        PathBuf::from(meta)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, bytes).await?;
        if let Some(content_type) = content_type {
            fs::write(Self::meta_path(&path), content_type).await?;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let path = self.object_path(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(key.to_string())),
            Err(e) => return Err(e.into()),
        };
        let content_type = fs::read_to_string(Self::meta_path(&path)).await.ok();

        Ok(StoredObject { bytes, content_type })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        for target in [Self::meta_path(&path), path] {
            match fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}
