use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{missing, PgDatabase};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewPagePermission, NewRole, PagePermission, Role};
use crate::database::repository::{PagePermissionStore, RoleStore, StoreResult};

#[derive(FromRow)]
struct RoleRow {
    id: Uuid,
    tenant_id: Uuid,
    role_name: String,
    role_description: String,
    is_default: bool,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            tenant_id: row.tenant_id,
            role_name: row.role_name,
            role_description: row.role_description,
            is_default: row.is_default,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ROLE_COLUMNS: &str =
    "id, tenant_id, role_name, role_description, is_default, created_by, created_at, updated_at";

#[async_trait]
impl RoleStore for PgDatabase {
    async fn list_roles(&self, tenant_id: Uuid) -> StoreResult<Vec<Role>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE tenant_id = $1 ORDER BY role_name",
            ROLE_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn get_role(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Role>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE tenant_id = $1 AND id = $2",
            ROLE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.map(Role::from))
    }

    async fn insert_role(&self, role: NewRole) -> StoreResult<Role> {
        let mut tx = self.manager.tenant_tx(role.tenant_id).await?;
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "INSERT INTO roles (id, tenant_id, role_name, role_description, is_default, created_by)
             VALUES ($1, $2, $3, $4, false, $5) RETURNING {}",
            ROLE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(role.tenant_id)
        .bind(&role.role_name)
        .bind(&role.role_description)
        .bind(role.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_unique(e, "role name"))?;
        tx.commit().await?;

        Ok(Role::from(row))
    }

    async fn rename_role(&self, tenant_id: Uuid, id: Uuid, role_name: &str) -> StoreResult<Role> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "UPDATE roles SET role_name = $3, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            ROLE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(role_name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_unique(e, "role name"))?
        .ok_or_else(|| missing("role", id))?;
        tx.commit().await?;

        Ok(Role::from(row))
    }

    async fn delete_role(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let result = sqlx::query("DELETE FROM roles WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(missing("role", id));
        }
        Ok(())
    }
}

#[derive(FromRow)]
struct PagePermissionRow {
    id: Uuid,
    tenant_id: Uuid,
    page_path: String,
    page_name: String,
    component_name: Option<String>,
    roles: Vec<String>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PagePermissionRow> for PagePermission {
    fn from(row: PagePermissionRow) -> Self {
        PagePermission {
            id: row.id,
            tenant_id: row.tenant_id,
            page_path: row.page_path,
            page_name: row.page_name,
            component_name: row.component_name,
            roles: row.roles,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PAGE_COLUMNS: &str =
    "id, tenant_id, page_path, page_name, component_name, roles, updated_by, created_at, updated_at";

#[async_trait]
impl PagePermissionStore for PgDatabase {
    async fn list_page_permissions(&self, tenant_id: Uuid) -> StoreResult<Vec<PagePermission>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, PagePermissionRow>(&format!(
            "SELECT {} FROM page_permissions WHERE tenant_id = $1 ORDER BY page_path",
            PAGE_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(rows.into_iter().map(PagePermission::from).collect())
    }

    async fn find_page_permission(&self, tenant_id: Uuid, page_path: &str) -> StoreResult<Option<PagePermission>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, PagePermissionRow>(&format!(
            "SELECT {} FROM page_permissions WHERE tenant_id = $1 AND page_path = $2",
            PAGE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(page_path)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.map(PagePermission::from))
    }

    async fn insert_page_permission(
        &self,
        tenant_id: Uuid,
        input: NewPagePermission,
        acting_user: Uuid,
    ) -> StoreResult<PagePermission> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, PagePermissionRow>(&format!(
            "INSERT INTO page_permissions (id, tenant_id, page_path, page_name, component_name, roles, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PAGE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(&input.page_path)
        .bind(&input.page_name)
        .bind(&input.component_name)
        .bind(&input.roles)
        .bind(acting_user)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_unique(e, "page permission"))?;
        tx.commit().await?;

        Ok(PagePermission::from(row))
    }

    async fn set_page_roles(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        roles: &[String],
        acting_user: Uuid,
    ) -> StoreResult<PagePermission> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, PagePermissionRow>(&format!(
            "UPDATE page_permissions SET roles = $3, updated_by = $4, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            PAGE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(roles)
        .bind(acting_user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| missing("page permission", id))?;
        tx.commit().await?;

        Ok(PagePermission::from(row))
    }
}
