use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{validate_key, ObjectStore, StorageError, StoredObject};

/// Bucket kept in process memory
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), StorageError> {
        validate_key(key)?;
        let object = StoredObject {
            bytes: bytes.to_vec(),
            content_type: content_type.map(str::to_string),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.objects.read().await.contains_key(key))
    }
}
