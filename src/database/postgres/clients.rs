use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{missing, parse_text, PgDatabase};
use crate::database::manager::DatabaseError;
use crate::database::models::{Client, ClientInput, Document, NewDocument, NewResource, Resource};
use crate::database::repository::{ClientStore, DocumentStore, ResourceStore, StoreResult};

#[derive(FromRow)]
struct ClientRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_by: Uuid,
    updated_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CLIENT_COLUMNS: &str =
    "id, tenant_id, name, email, phone, address, created_by, updated_by, created_at, updated_at";

#[async_trait]
impl ClientStore for PgDatabase {
    async fn insert_client(&self, tenant_id: Uuid, input: ClientInput, acting_user: Uuid) -> StoreResult<Client> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "INSERT INTO clients (id, tenant_id, name, email, phone, address, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(acting_user)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Client::from(row))
    }

    async fn list_clients(&self, tenant_id: Uuid) -> StoreResult<Vec<Client>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients WHERE tenant_id = $1 ORDER BY name",
            CLIENT_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn get_client(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Client>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients WHERE tenant_id = $1 AND id = $2",
            CLIENT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.map(Client::from))
    }

    async fn update_client(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: ClientInput,
        acting_user: Uuid,
    ) -> StoreResult<Client> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "UPDATE clients SET name = $3, email = $4, phone = $5, address = $6,
                    updated_by = $7, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(acting_user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| missing("client", id))?;
        tx.commit().await?;

        Ok(Client::from(row))
    }

    async fn delete_client(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let result = sqlx::query("DELETE FROM clients WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(missing("client", id));
        }
        Ok(())
    }
}

#[derive(FromRow)]
struct ResourceRow {
    id: Uuid,
    tenant_id: Uuid,
    client_id: Uuid,
    resource_type: String,
    title: String,
    description: Option<String>,
    file_path: Option<String>,
    file_size: Option<i64>,
    mime_type: Option<String>,
    url: Option<String>,
    is_active: bool,
    created_by: Uuid,
    updated_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = DatabaseError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Resource {
            id: row.id,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            resource_type: parse_text(&row.resource_type)?,
            title: row.title,
            description: row.description,
            file_path: row.file_path,
            file_size: row.file_size,
            mime_type: row.mime_type,
            url: row.url,
            is_active: row.is_active,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const RESOURCE_COLUMNS: &str = "id, tenant_id, client_id, resource_type, title, description, file_path, \
     file_size, mime_type, url, is_active, created_by, updated_by, created_at, updated_at";

#[async_trait]
impl ResourceStore for PgDatabase {
    async fn insert_resource(&self, resource: NewResource) -> StoreResult<Resource> {
        let mut tx = self.manager.tenant_tx(resource.tenant_id).await?;
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            "INSERT INTO resources (id, tenant_id, client_id, resource_type, title, description,
                                    file_path, file_size, mime_type, url, is_active, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, true, $11, $11) RETURNING {}",
            RESOURCE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(resource.tenant_id)
        .bind(resource.client_id)
        .bind(resource.resource_type.as_str())
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.file_path)
        .bind(resource.file_size)
        .bind(&resource.mime_type)
        .bind(&resource.url)
        .bind(resource.created_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Resource::try_from(row)
    }

    async fn list_active_resources(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Resource>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {} FROM resources
             WHERE tenant_id = $1 AND client_id = $2 AND is_active
             ORDER BY created_at DESC",
            RESOURCE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        rows.into_iter().map(Resource::try_from).collect()
    }

    async fn get_resource(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Resource>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {} FROM resources WHERE tenant_id = $1 AND id = $2",
            RESOURCE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        row.map(Resource::try_from).transpose()
    }

    async fn deactivate_resource(&self, tenant_id: Uuid, id: Uuid, acting_user: Uuid) -> StoreResult<Resource> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            "UPDATE resources SET is_active = false, updated_by = $3, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            RESOURCE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(acting_user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| missing("resource", id))?;
        tx.commit().await?;

        Resource::try_from(row)
    }
}

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    tenant_id: Uuid,
    client_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    file_path: String,
    file_size: i64,
    mime_type: String,
    created_by: Uuid,
    updated_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            title: row.title,
            description: row.description,
            file_path: row.file_path,
            file_size: row.file_size,
            mime_type: row.mime_type,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const DOCUMENT_COLUMNS: &str = "id, tenant_id, client_id, title, description, file_path, file_size, \
     mime_type, created_by, updated_by, created_at, updated_at";

#[async_trait]
impl DocumentStore for PgDatabase {
    async fn insert_document(&self, document: NewDocument) -> StoreResult<Document> {
        let mut tx = self.manager.tenant_tx(document.tenant_id).await?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "INSERT INTO documents (id, tenant_id, client_id, title, description, file_path,
                                    file_size, mime_type, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(document.tenant_id)
        .bind(document.client_id)
        .bind(&document.title)
        .bind(&document.description)
        .bind(&document.file_path)
        .bind(document.file_size)
        .bind(&document.mime_type)
        .bind(document.created_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Document::from(row))
    }

    async fn list_documents(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> StoreResult<Vec<Document>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {} FROM documents
             WHERE tenant_id = $1 AND ($2::uuid IS NULL OR client_id = $2)
             ORDER BY created_at DESC",
            DOCUMENT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Document>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE tenant_id = $1 AND id = $2",
            DOCUMENT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.map(Document::from))
    }

    async fn delete_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let result = sqlx::query("DELETE FROM documents WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(missing("document", id));
        }
        Ok(())
    }
}
