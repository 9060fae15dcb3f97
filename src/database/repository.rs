//! Store traits. Every tenant-scoped call takes the tenant id explicitly so
//! implementations can enforce isolation (row-level security in PostgreSQL,
//! filtering in memory).

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Branding, Client, ClientInput, Document, Goal, GoalInput, Homework, HomeworkStatus,
    Membership, NewDocument, NewHomework, NewPagePermission, NewResource, NewRole, NewSession,
    NewSessionNote, NewTenant, NewUser, NoteContent, PagePermission, Resource, Role, Session,
    SessionNote, SessionStatus, TemplateSettings, Tenant, TenantStatus, TenantUser, User,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Create the tenant, its owner identity and the owner membership in one step
    async fn register_practice(&self, tenant: NewTenant, owner: NewUser) -> StoreResult<(Tenant, TenantUser)>;
    async fn get_tenant(&self, tenant_id: Uuid) -> StoreResult<Option<Tenant>>;
    /// Newest first
    async fn list_tenants(&self) -> StoreResult<Vec<Tenant>>;
    async fn set_tenant_status(&self, tenant_id: Uuid, status: TenantStatus) -> StoreResult<Tenant>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_membership(&self, user_id: Uuid) -> StoreResult<Option<Membership>>;
    async fn upsert_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        role: &str,
        acting_user: Uuid,
    ) -> StoreResult<Membership>;
    async fn list_tenant_users(&self, tenant_id: Uuid) -> StoreResult<Vec<TenantUser>>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Custom roles ordered by name
    async fn list_roles(&self, tenant_id: Uuid) -> StoreResult<Vec<Role>>;
    async fn get_role(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Role>>;
    /// Fails with `Conflict` when the name exists for the tenant
    async fn insert_role(&self, role: NewRole) -> StoreResult<Role>;
    async fn rename_role(&self, tenant_id: Uuid, id: Uuid, role_name: &str) -> StoreResult<Role>;
    async fn delete_role(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait PagePermissionStore: Send + Sync {
    async fn list_page_permissions(&self, tenant_id: Uuid) -> StoreResult<Vec<PagePermission>>;
    async fn find_page_permission(&self, tenant_id: Uuid, page_path: &str) -> StoreResult<Option<PagePermission>>;
    async fn insert_page_permission(
        &self,
        tenant_id: Uuid,
        input: NewPagePermission,
        acting_user: Uuid,
    ) -> StoreResult<PagePermission>;
    async fn set_page_roles(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        roles: &[String],
        acting_user: Uuid,
    ) -> StoreResult<PagePermission>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn insert_client(&self, tenant_id: Uuid, input: ClientInput, acting_user: Uuid) -> StoreResult<Client>;
    /// Ordered by name
    async fn list_clients(&self, tenant_id: Uuid) -> StoreResult<Vec<Client>>;
    async fn get_client(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Client>>;
    async fn update_client(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: ClientInput,
        acting_user: Uuid,
    ) -> StoreResult<Client>;
    async fn delete_client(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn insert_resource(&self, resource: NewResource) -> StoreResult<Resource>;
    /// Only `is_active` rows, newest first
    async fn list_active_resources(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Resource>>;
    async fn get_resource(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Resource>>;
    /// Soft delete: sets `is_active = false`
    async fn deactivate_resource(&self, tenant_id: Uuid, id: Uuid, acting_user: Uuid) -> StoreResult<Resource>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, document: NewDocument) -> StoreResult<Document>;
    /// Newest first, optionally narrowed to one client
    async fn list_documents(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> StoreResult<Vec<Document>>;
    async fn get_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Document>>;
    /// Hard delete of the metadata row
    async fn delete_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait ClinicalStore: Send + Sync {
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session>;
    /// Most recent appointment first
    async fn list_sessions(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Session>>;
    async fn get_session(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Session>>;
    async fn update_session_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: SessionStatus,
        acting_user: Uuid,
    ) -> StoreResult<Session>;
    async fn set_session_room(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        room_sid: Option<String>,
        acting_user: Uuid,
    ) -> StoreResult<Session>;

    async fn insert_note(&self, note: NewSessionNote) -> StoreResult<SessionNote>;
    /// Newest first
    async fn list_notes(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<SessionNote>>;
    async fn get_note(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<SessionNote>>;
    async fn update_note(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        content: NoteContent,
        acting_user: Uuid,
    ) -> StoreResult<SessionNote>;
    async fn delete_note(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()>;

    async fn insert_homework(&self, homework: NewHomework) -> StoreResult<Homework>;
    /// Earliest due date first, undated last
    async fn list_homework(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Homework>>;
    async fn set_homework_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: HomeworkStatus,
        acting_user: Uuid,
    ) -> StoreResult<Homework>;
    async fn delete_homework(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()>;

    /// Ordered by position
    async fn list_goals(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Goal>>;
    /// Atomically replaces the client's goal list
    async fn replace_goals(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
        goals: Vec<GoalInput>,
        acting_user: Uuid,
    ) -> StoreResult<Vec<Goal>>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_branding(&self, tenant_id: Uuid) -> StoreResult<Option<Branding>>;
    async fn upsert_branding(&self, branding: Branding) -> StoreResult<Branding>;
    async fn get_template_settings(&self, tenant_id: Uuid) -> StoreResult<Option<TemplateSettings>>;
    async fn upsert_template_settings(&self, settings: TemplateSettings) -> StoreResult<TemplateSettings>;
}

/// Everything the application needs from a backing store
pub trait Database:
    TenantStore
    + UserStore
    + RoleStore
    + PagePermissionStore
    + ClientStore
    + ResourceStore
    + DocumentStore
    + ClinicalStore
    + SettingsStore
{
}

impl<T> Database for T where
    T: TenantStore
        + UserStore
        + RoleStore
        + PagePermissionStore
        + ClientStore
        + ResourceStore
        + DocumentStore
        + ClinicalStore
        + SettingsStore
{
}

/// Sort key placing undated homework after dated homework
pub(crate) fn due_date_key(due: Option<NaiveDate>) -> (bool, Option<NaiveDate>) {
    (due.is_none(), due)
}
