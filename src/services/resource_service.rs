//! Client learning resources: uploaded files or external links.
//!
//! Uploads go to the object store first and the metadata row second. When the
//! row cannot be written the object is removed again. Deletion is soft.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{NewResource, Resource, ResourceType};
use crate::database::{ClientStore, ResourceStore};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::upload::{
    check_upload, mime_type, parse_client_id, require_authenticated, required_title, timestamped_name,
};
use crate::storage::{ObjectStore, StoredObject};
use crate::types::{FileUpload, TenantContext};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateResourceInput {
    pub client_id: String,
    pub resource_type: ResourceType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(skip)]
    pub file: Option<FileUpload>,
}

/// `{user_id}/{timestamp_ms}-{suffix}.{ext}`
pub fn resource_object_key(user_id: Uuid, file_name: &str) -> String {
    format!("{}/{}", user_id, timestamped_name(file_name))
}

#[derive(Clone)]
pub struct ResourceService {
    resources: Arc<dyn ResourceStore>,
    clients: Arc<dyn ClientStore>,
    objects: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
}

impl ResourceService {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        clients: Arc<dyn ClientStore>,
        objects: Arc<dyn ObjectStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            resources,
            clients,
            objects,
            max_upload_bytes,
        }
    }

    pub async fn create_resource(&self, ctx: &TenantContext, input: CreateResourceInput) -> ServiceResult<Resource> {
        require_authenticated(ctx)?;
        let client_id = parse_client_id(&input.client_id)?;
        let title = required_title(&input.title)?;
        let description = input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());

        match input.resource_type {
            ResourceType::Url => {
                let url = validate_link(input.url.as_deref())?;
                self.ensure_client(ctx, client_id).await?;

                let resource = self
                    .resources
                    .insert_resource(NewResource {
                        tenant_id: ctx.tenant_id,
                        client_id,
                        resource_type: ResourceType::Url,
                        title,
                        description,
                        file_path: None,
                        file_size: None,
                        mime_type: None,
                        url: Some(url),
                        created_by: ctx.user_id,
                    })
                    .await?;

                info!("Linked resource {} for client {}", resource.id, client_id);
                Ok(resource)
            }
            ResourceType::Document => {
                let file = input
                    .file
                    .ok_or_else(|| ServiceError::validation("A file is required for document resources"))?;
                check_upload(&file, self.max_upload_bytes)?;
                self.ensure_client(ctx, client_id).await?;

                let key = resource_object_key(ctx.user_id, &file.file_name);
                let mime = mime_type(&file);
                self.objects.put(&key, &file.bytes, Some(&mime)).await?;

                let inserted = self
                    .resources
                    .insert_resource(NewResource {
                        tenant_id: ctx.tenant_id,
                        client_id,
                        resource_type: ResourceType::Document,
                        title,
                        description,
                        file_path: Some(key.clone()),
                        file_size: Some(file.size()),
                        mime_type: Some(mime),
                        url: None,
                        created_by: ctx.user_id,
                    })
                    .await;

                match inserted {
                    Ok(resource) => {
                        info!("Uploaded resource {} ({} bytes) to {}", resource.id, file.size(), key);
                        Ok(resource)
                    }
                    Err(err) => {
                        if let Err(cleanup) = self.objects.remove(&key).await {
                            warn!("Failed to remove orphaned object {}/{}: {}", self.objects.bucket(), key, cleanup);
                        }
                        Err(err.into())
                    }
                }
            }
        }
    }

    /// Active resources only, newest first
    pub async fn get_client_resources(&self, ctx: &TenantContext, client_id: &str) -> ServiceResult<Vec<Resource>> {
        let client_id = parse_client_id(client_id)?;
        Ok(self.resources.list_active_resources(ctx.tenant_id, client_id).await?)
    }

    pub async fn get_resource(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<Resource> {
        self.resources
            .get_resource(ctx.tenant_id, id)
            .await?
            .filter(|r| r.is_active)
            .ok_or_else(|| ServiceError::not_found("Resource not found"))
    }

    /// Raw object bytes. Callers authorize through the metadata row first.
    pub async fn download_resource(&self, file_path: &str) -> ServiceResult<StoredObject> {
        Ok(self.objects.get(file_path).await?)
    }

    /// Looks up the row in the caller's tenant, then fetches its bytes
    pub async fn download_for(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<(Resource, StoredObject)> {
        let resource = self.get_resource(ctx, id).await?;
        let path = resource
            .file_path
            .clone()
            .ok_or_else(|| ServiceError::not_found("Resource has no file"))?;
        let object = self.download_resource(&path).await?;
        Ok((resource, object))
    }

    /// Removes the stored object when there is one, then marks the row inactive.
    /// A storage failure is logged and does not block the soft delete.
    pub async fn delete_resource(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<Resource> {
        require_authenticated(ctx)?;
        let resource = self
            .resources
            .get_resource(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Resource not found"))?;

        if let Some(path) = resource.file_path.as_deref() {
            if let Err(err) = self.objects.remove(path).await {
                warn!("Failed to remove object {}/{}: {}", self.objects.bucket(), path, err);
            }
        }

        let resource = self.resources.deactivate_resource(ctx.tenant_id, id, ctx.user_id).await?;
        info!("Deactivated resource {}", resource.id);
        Ok(resource)
    }

    async fn ensure_client(&self, ctx: &TenantContext, client_id: Uuid) -> ServiceResult<()> {
        match self.clients.get_client(ctx.tenant_id, client_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("Client not found")),
        }
    }
}

fn validate_link(url: Option<&str>) -> ServiceResult<String> {
    let raw = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ServiceError::validation("A URL is required for link resources"))?;

    match url::Url::parse(raw) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(raw.to_string()),
        _ => Err(ServiceError::validation("URL must be an absolute http(s) address")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseError;
    use crate::database::models::ClientInput;
    use crate::database::{MemoryDatabase, StoreResult};
    use crate::storage::{MemoryObjectStore, StorageError};
    use async_trait::async_trait;

    const LIMIT: usize = 25 * 1024 * 1024;

    struct FailingInsert;

    #[async_trait]
    impl ResourceStore for FailingInsert {
        async fn insert_resource(&self, _: NewResource) -> StoreResult<Resource> {
            Err(DatabaseError::QueryError("insert rejected".into()))
        }
        async fn list_active_resources(&self, _: Uuid, _: Uuid) -> StoreResult<Vec<Resource>> {
            Ok(Vec::new())
        }
        async fn get_resource(&self, _: Uuid, _: Uuid) -> StoreResult<Option<Resource>> {
            Ok(None)
        }
        async fn deactivate_resource(&self, _: Uuid, id: Uuid, _: Uuid) -> StoreResult<Resource> {
            Err(DatabaseError::NotFound(id.to_string()))
        }
    }

    struct FailingRemove(MemoryObjectStore);

    #[async_trait]
    impl ObjectStore for FailingRemove {
        fn bucket(&self) -> &str {
            self.0.bucket()
        }
        async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), StorageError> {
            self.0.put(key, bytes, content_type).await
        }
        async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
            self.0.get(key).await
        }
        async fn remove(&self, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "bucket offline")))
        }
        async fn exists(&self, key: &str) -> Result<bool, StorageError> {
            self.0.exists(key).await
        }
    }

    async fn setup() -> (Arc<MemoryDatabase>, TenantContext, Uuid) {
        let db = Arc::new(MemoryDatabase::new());
        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), "p@clinic.test", "practitioner");
        let client = db
            .insert_client(ctx.tenant_id, ClientInput { name: "Casey".into(), ..Default::default() }, ctx.user_id)
            .await
            .unwrap();
        (db, ctx, client.id)
    }

    fn pdf_input(client_id: Uuid, bytes: Vec<u8>) -> CreateResourceInput {
        CreateResourceInput {
            client_id: client_id.to_string(),
            resource_type: ResourceType::Document,
            title: "Sleep hygiene".into(),
            description: None,
            url: None,
            file: Some(FileUpload::new("sleep.pdf", Some("application/pdf".into()), bytes)),
        }
    }

    #[tokio::test]
    async fn two_megabyte_pdf_is_recorded_with_size_and_mime() {
        let (db, ctx, client_id) = setup().await;
        let objects = Arc::new(MemoryObjectStore::new("client-resources"));
        let service = ResourceService::new(db.clone(), db.clone(), objects.clone(), LIMIT);

        let resource = service
            .create_resource(&ctx, pdf_input(client_id, vec![0u8; 2 * 1024 * 1024]))
            .await
            .unwrap();

        assert_eq!(resource.file_size, Some(2_097_152));
        assert_eq!(resource.mime_type.as_deref(), Some("application/pdf"));
        assert!(resource.is_active);

        let key = resource.file_path.unwrap();
        assert!(key.starts_with(&format!("{}/", ctx.user_id)));
        assert!(key.ends_with(".pdf"));
        assert!(objects.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn failed_metadata_insert_leaves_no_object_behind() {
        let (db, ctx, client_id) = setup().await;
        let objects = Arc::new(MemoryObjectStore::new("client-resources"));
        let service = ResourceService::new(Arc::new(FailingInsert), db, objects.clone(), LIMIT);

        let err = service.create_resource(&ctx, pdf_input(client_id, vec![1; 64])).await.unwrap_err();

        assert!(matches!(err, ServiceError::Unknown(_)));
        assert_eq!(objects.len().await, 0);
    }

    #[tokio::test]
    async fn delete_deactivates_even_when_storage_removal_fails() {
        let (db, ctx, client_id) = setup().await;
        let objects = Arc::new(FailingRemove(MemoryObjectStore::new("client-resources")));
        let service = ResourceService::new(db.clone(), db.clone(), objects, LIMIT);

        let resource = service.create_resource(&ctx, pdf_input(client_id, vec![1; 16])).await.unwrap();
        let deleted = service.delete_resource(&ctx, resource.id).await.unwrap();

        assert!(!deleted.is_active);
        let stored = db.get_resource(ctx.tenant_id, resource.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(service
            .get_client_resources(&ctx, &client_id.to_string())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn link_resources_skip_the_object_store() {
        let (db, ctx, client_id) = setup().await;
        let objects = Arc::new(MemoryObjectStore::new("client-resources"));
        let service = ResourceService::new(db.clone(), db, objects.clone(), LIMIT);

        let input = CreateResourceInput {
            client_id: client_id.to_string(),
            resource_type: ResourceType::Url,
            title: "Breathing video".into(),
            description: Some("  ".into()),
            url: Some("https://example.com/breathe".into()),
            file: None,
        };
        let resource = service.create_resource(&ctx, input).await.unwrap();

        assert_eq!(resource.url.as_deref(), Some("https://example.com/breathe"));
        assert!(resource.description.is_none());
        assert_eq!(objects.len().await, 0);
    }

    #[tokio::test]
    async fn input_is_validated_before_upload() {
        let (db, ctx, client_id) = setup().await;
        let objects = Arc::new(MemoryObjectStore::new("client-resources"));
        let service = ResourceService::new(db.clone(), db, objects.clone(), 8);

        let mut bad_id = pdf_input(client_id, vec![1]);
        bad_id.client_id = "client-7".into();
        let err = service.create_resource(&ctx, bad_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "Invalid client ID"));

        let mut no_file = pdf_input(client_id, vec![1]);
        no_file.file = None;
        assert!(matches!(service.create_resource(&ctx, no_file).await, Err(ServiceError::Validation(_))));

        let too_big = pdf_input(client_id, vec![1; 9]);
        assert!(matches!(service.create_resource(&ctx, too_big).await, Err(ServiceError::Validation(_))));

        let anonymous = TenantContext::new(ctx.tenant_id, Uuid::nil(), "", "practitioner");
        let err = service.create_resource(&anonymous, pdf_input(client_id, vec![1])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(_)));

        assert_eq!(objects.len().await, 0);
    }

    #[tokio::test]
    async fn other_tenants_cannot_read_resources() {
        let (db, ctx, client_id) = setup().await;
        let objects = Arc::new(MemoryObjectStore::new("client-resources"));
        let service = ResourceService::new(db.clone(), db, objects, LIMIT);
        let resource = service.create_resource(&ctx, pdf_input(client_id, vec![7; 4])).await.unwrap();

        let (_, object) = service.download_for(&ctx, resource.id).await.unwrap();
        assert_eq!(object.bytes, vec![7; 4]);

        let outsider = TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), "o@other.test", "owner");
        assert!(matches!(
            service.download_for(&outsider, resource.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
