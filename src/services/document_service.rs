//! Practice documents. Same upload contract as resources, but stored under a
//! tenant prefix and removed for good on delete.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{Document, NewDocument};
use crate::database::{ClientStore, DocumentStore};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::upload::{
    check_upload, mime_type, parse_client_id, require_authenticated, required_title, timestamped_name,
};
use crate::storage::{ObjectStore, StoredObject};
use crate::types::{FileUpload, TenantContext};

#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    pub client_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub file: Option<FileUpload>,
}

/// `{tenant_id}/{user_id}/{timestamp_ms}-{suffix}.{ext}`, or `{user_id}/...`
/// when no tenant is known
pub fn document_object_key(tenant_id: Option<Uuid>, user_id: Uuid, file_name: &str) -> String {
    match tenant_id.filter(|t| !t.is_nil()) {
        Some(tenant_id) => format!("{}/{}/{}", tenant_id, user_id, timestamped_name(file_name)),
        None => format!("{}/{}", user_id, timestamped_name(file_name)),
    }
}

#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentStore>,
    clients: Arc<dyn ClientStore>,
    objects: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        clients: Arc<dyn ClientStore>,
        objects: Arc<dyn ObjectStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            documents,
            clients,
            objects,
            max_upload_bytes,
        }
    }

    pub async fn create_document(&self, ctx: &TenantContext, input: CreateDocumentInput) -> ServiceResult<Document> {
        require_authenticated(ctx)?;
        let client_id = match input.client_id.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => Some(parse_client_id(raw)?),
            None => None,
        };
        let title = required_title(&input.title)?;
        let file = input.file.ok_or_else(|| ServiceError::validation("A file is required"))?;
        check_upload(&file, self.max_upload_bytes)?;

        if let Some(client_id) = client_id {
            if self.clients.get_client(ctx.tenant_id, client_id).await?.is_none() {
                return Err(ServiceError::not_found("Client not found"));
            }
        }

        let key = document_object_key(Some(ctx.tenant_id), ctx.user_id, &file.file_name);
        let mime = mime_type(&file);
        self.objects.put(&key, &file.bytes, Some(&mime)).await?;

        let inserted = self
            .documents
            .insert_document(NewDocument {
                tenant_id: ctx.tenant_id,
                client_id,
                title,
                description: input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
                file_path: key.clone(),
                file_size: file.size(),
                mime_type: mime,
                created_by: ctx.user_id,
            })
            .await;

        match inserted {
            Ok(document) => {
                info!("Uploaded document {} ({} bytes) to {}", document.id, document.file_size, key);
                Ok(document)
            }
            Err(err) => {
                if let Err(cleanup) = self.objects.remove(&key).await {
                    warn!("Failed to remove orphaned object {}/{}: {}", self.objects.bucket(), key, cleanup);
                }
                Err(err.into())
            }
        }
    }

    /// Newest first, optionally for one client
    pub async fn list_documents(&self, ctx: &TenantContext, client_id: Option<&str>) -> ServiceResult<Vec<Document>> {
        let client_id = client_id.map(parse_client_id).transpose()?;
        Ok(self.documents.list_documents(ctx.tenant_id, client_id).await?)
    }

    pub async fn get_document(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<Document> {
        self.documents
            .get_document(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document not found"))
    }

    pub async fn download_document(&self, file_path: &str) -> ServiceResult<StoredObject> {
        Ok(self.objects.get(file_path).await?)
    }

    pub async fn download_for(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<(Document, StoredObject)> {
        let document = self.get_document(ctx, id).await?;
        let object = self.download_document(&document.file_path).await?;
        Ok((document, object))
    }

    /// Hard delete. A storage failure is logged and the row is deleted anyway.
    pub async fn delete_document(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<()> {
        require_authenticated(ctx)?;
        let document = self.get_document(ctx, id).await?;

        if let Err(err) = self.objects.remove(&document.file_path).await {
            warn!("Failed to remove object {}/{}: {}", self.objects.bucket(), document.file_path, err);
        }

        self.documents.delete_document(ctx.tenant_id, id).await?;
        info!("Deleted document {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseError;
    use crate::database::{MemoryDatabase, StoreResult};
    use crate::storage::MemoryObjectStore;
    use async_trait::async_trait;

    struct RejectingDocuments;

    #[async_trait]
    impl DocumentStore for RejectingDocuments {
        async fn insert_document(&self, _: NewDocument) -> StoreResult<Document> {
            Err(DatabaseError::QueryError("insert rejected".into()))
        }
        async fn list_documents(&self, _: Uuid, _: Option<Uuid>) -> StoreResult<Vec<Document>> {
            Ok(Vec::new())
        }
        async fn get_document(&self, _: Uuid, _: Uuid) -> StoreResult<Option<Document>> {
            Ok(None)
        }
        async fn delete_document(&self, _: Uuid, _: Uuid) -> StoreResult<()> {
            Ok(())
        }
    }

    fn ctx() -> TenantContext {
        TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), "p@clinic.test", "practitioner")
    }

    fn upload(title: &str) -> CreateDocumentInput {
        CreateDocumentInput {
            client_id: None,
            title: title.into(),
            description: None,
            file: Some(FileUpload::new("consent.pdf", None, b"%PDF-1.7".to_vec())),
        }
    }

    #[test]
    fn keys_are_tenant_prefixed_when_tenant_known() {
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());

        let scoped = document_object_key(Some(tenant), user, "a.pdf");
        assert!(scoped.starts_with(&format!("{}/{}/", tenant, user)));

        let unscoped = document_object_key(None, user, "a.pdf");
        assert!(unscoped.starts_with(&format!("{}/", user)));
        assert_eq!(unscoped.matches('/').count(), 1);
        assert_eq!(document_object_key(Some(Uuid::nil()), user, "a.pdf").matches('/').count(), 1);
    }

    #[tokio::test]
    async fn delete_removes_row_and_object() {
        let db = Arc::new(MemoryDatabase::new());
        let objects = Arc::new(MemoryObjectStore::new("documents"));
        let service = DocumentService::new(db.clone(), db.clone(), objects.clone(), 1024);
        let ctx = ctx();

        let document = service.create_document(&ctx, upload("Consent")).await.unwrap();
        assert_eq!(document.mime_type, "application/pdf");
        assert_eq!(objects.len().await, 1);

        service.delete_document(&ctx, document.id).await.unwrap();
        assert_eq!(objects.len().await, 0);
        assert!(matches!(
            service.get_document(&ctx, document.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_insert_removes_uploaded_object() {
        let db = Arc::new(MemoryDatabase::new());
        let objects = Arc::new(MemoryObjectStore::new("documents"));
        let service = DocumentService::new(Arc::new(RejectingDocuments), db, objects.clone(), 1024);

        assert!(service.create_document(&ctx(), upload("Consent")).await.is_err());
        assert_eq!(objects.len().await, 0);
    }

    #[tokio::test]
    async fn listing_can_be_narrowed_to_a_client() {
        let db = Arc::new(MemoryDatabase::new());
        let objects = Arc::new(MemoryObjectStore::new("documents"));
        let service = DocumentService::new(db.clone(), db.clone(), objects, 1024);
        let ctx = ctx();
        let client = db
            .insert_client(ctx.tenant_id, crate::database::models::ClientInput { name: "Kim".into(), ..Default::default() }, ctx.user_id)
            .await
            .unwrap();

        service.create_document(&ctx, upload("Practice policy")).await.unwrap();
        let mut intake = upload("Intake");
        intake.client_id = Some(client.id.to_string());
        service.create_document(&ctx, intake).await.unwrap();

        assert_eq!(service.list_documents(&ctx, None).await.unwrap().len(), 2);
        let for_client = service.list_documents(&ctx, Some(&client.id.to_string())).await.unwrap();
        assert_eq!(for_client.len(), 1);
        assert_eq!(for_client[0].title, "Intake");
    }
}
