use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{missing, parse_text, PgDatabase};
use crate::database::manager::DatabaseError;
use crate::database::models::{Membership, NewTenant, NewUser, Tenant, TenantStatus, TenantUser, User};
use crate::database::repository::{StoreResult, TenantStore, UserStore};

#[derive(FromRow)]
struct TenantRow {
    tenant_id: Uuid,
    practice_name: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = DatabaseError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            tenant_id: row.tenant_id,
            practice_name: row.practice_name,
            status: parse_text(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TenantUserRow {
    user_id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    tenant_id: Uuid,
    has_password: bool,
}

impl From<TenantUserRow> for TenantUser {
    fn from(row: TenantUserRow) -> Self {
        TenantUser {
            user_id: row.user_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            tenant_id: row.tenant_id,
            has_password: row.has_password,
        }
    }
}

const TENANT_COLUMNS: &str = "tenant_id, practice_name, status, created_at, updated_at";
const USER_COLUMNS: &str = "user_id, email, first_name, last_name, password_hash, created_at";
const MEMBERSHIP_COLUMNS: &str = "user_id, tenant_id, role, created_by, updated_at";

#[async_trait]
impl TenantStore for PgDatabase {
    async fn register_practice(&self, tenant: NewTenant, owner: NewUser) -> StoreResult<(Tenant, TenantUser)> {
        let mut tx = self.manager.pool().begin().await?;

        let tenant_row = sqlx::query_as::<_, TenantRow>(&format!(
            "INSERT INTO tenants (tenant_id, practice_name, status) VALUES ($1, $2, 'active') RETURNING {}",
            TENANT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&tenant.practice_name)
        .fetch_one(&mut *tx)
        .await?;
        let tenant = Tenant::try_from(tenant_row)?;

        let user = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (user_id, email, first_name, last_name, password_hash)
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&owner.email)
        .bind(&owner.first_name)
        .bind(&owner.last_name)
        .bind(&owner.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_unique(e, "user email"))?;
        let user = User::from(user);

        let membership = sqlx::query_as::<_, MembershipRow>(&format!(
            "INSERT INTO memberships (user_id, tenant_id, role, created_by)
             VALUES ($1, $2, 'owner', $1) RETURNING {}",
            MEMBERSHIP_COLUMNS
        ))
        .bind(user.user_id)
        .bind(tenant.tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let owner = TenantUser::from_parts(&user, &Membership::from(membership));
        Ok((tenant, owner))
    }

    async fn get_tenant(&self, tenant_id: Uuid) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE tenant_id = $1",
            TENANT_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_optional(self.manager.pool())
        .await?;

        row.map(Tenant::try_from).transpose()
    }

    async fn list_tenants(&self) -> StoreResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants ORDER BY created_at DESC",
            TENANT_COLUMNS
        ))
        .fetch_all(self.manager.pool())
        .await?;

        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn set_tenant_status(&self, tenant_id: Uuid, status: TenantStatus) -> StoreResult<Tenant> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "UPDATE tenants SET status = $2, updated_at = now() WHERE tenant_id = $1 RETURNING {}",
            TENANT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(status.as_str())
        .fetch_optional(self.manager.pool())
        .await?
        .ok_or_else(|| missing("tenant", tenant_id))?;

        Tenant::try_from(row)
    }
}

#[derive(FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct MembershipRow {
    user_id: Uuid,
    tenant_id: Uuid,
    role: String,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Membership {
            user_id: row.user_id,
            tenant_id: row.tenant_id,
            role: row.role,
            created_by: row.created_by,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserStore for PgDatabase {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(self.manager.pool())
            .await?;

        Ok(row.map(User::from))
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(self.manager.pool())
            .await?;

        Ok(row.map(User::from))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (user_id, email, first_name, last_name, password_hash)
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .fetch_one(self.manager.pool())
        .await
        .map_err(|e| DatabaseError::from_unique(e, "user email"))?;

        Ok(User::from(row))
    }

    async fn get_membership(&self, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "SELECT {} FROM memberships WHERE user_id = $1",
            MEMBERSHIP_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(self.manager.pool())
        .await?;

        Ok(row.map(Membership::from))
    }

    async fn upsert_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        role: &str,
        acting_user: Uuid,
    ) -> StoreResult<Membership> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "INSERT INTO memberships (user_id, tenant_id, role, created_by)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE
                SET tenant_id = EXCLUDED.tenant_id,
                    role = EXCLUDED.role,
                    created_by = EXCLUDED.created_by,
                    updated_at = now()
             RETURNING {}",
            MEMBERSHIP_COLUMNS
        ))
        .bind(user_id)
        .bind(tenant_id)
        .bind(role)
        .bind(acting_user)
        .fetch_one(self.manager.pool())
        .await?;

        Ok(Membership::from(row))
    }

    async fn list_tenant_users(&self, tenant_id: Uuid) -> StoreResult<Vec<TenantUser>> {
        let rows = sqlx::query_as::<_, TenantUserRow>(
            "SELECT u.user_id, u.email, u.first_name, u.last_name, m.role, m.tenant_id,
                    (u.password_hash IS NOT NULL) AS has_password
             FROM memberships m
             JOIN users u ON u.user_id = m.user_id
             WHERE m.tenant_id = $1
             ORDER BY u.email",
        )
        .bind(tenant_id)
        .fetch_all(self.manager.pool())
        .await?;

        Ok(rows.into_iter().map(TenantUser::from).collect())
    }
}
