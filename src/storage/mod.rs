//! Object storage for uploaded files. Each bucket is a separate [`ObjectStore`].

pub mod local;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stored bytes plus the content type recorded at upload time
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, used in log lines
    fn bucket(&self) -> &str;

    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Removing a missing key succeeds
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Keys are relative `/`-separated paths with no empty, `.` or `..` segments
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..");

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_and_absolute_keys() {
        assert!(validate_key("user/1700000000000-ab12cd.pdf").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("").is_err());
    }
}
