//! In-process store used by tests and by the server when no `DATABASE_URL`
//! is configured. Isolation is enforced by filtering on `tenant_id`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Branding, Client, ClientInput, Document, Goal, GoalInput, Homework, HomeworkStatus,
    Membership, NewDocument, NewHomework, NewPagePermission, NewResource, NewRole, NewSession,
    NewSessionNote, NewTenant, NewUser, NoteContent, PagePermission, Resource, Role, Session,
    SessionNote, SessionStatus, TemplateSettings, Tenant, TenantStatus, TenantUser, User,
};
use crate::database::repository::{
    due_date_key, ClientStore, ClinicalStore, DocumentStore, PagePermissionStore, ResourceStore,
    RoleStore, SettingsStore, StoreResult, TenantStore, UserStore,
};

#[derive(Default)]
struct MemoryState {
    tenants: HashMap<Uuid, Tenant>,
    users: HashMap<Uuid, User>,
    memberships: HashMap<Uuid, Membership>,
    roles: HashMap<Uuid, Role>,
    page_permissions: HashMap<Uuid, PagePermission>,
    clients: HashMap<Uuid, Client>,
    resources: HashMap<Uuid, Resource>,
    documents: HashMap<Uuid, Document>,
    sessions: HashMap<Uuid, Session>,
    notes: HashMap<Uuid, SessionNote>,
    homework: HomeworkTable,
    goals: HashMap<Uuid, Goal>,
    branding: HashMap<Uuid, Branding>,
    template_settings: HashMap<Uuid, TemplateSettings>,
}

type HomeworkTable = HashMap<Uuid, Homework>;

#[derive(Default)]
pub struct MemoryDatabase {
    state: RwLock<MemoryState>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", what, id))
}

fn tenant_rows<'a, T, F>(rows: &'a HashMap<Uuid, T>, keep: F) -> Vec<T>
where
    T: Clone + 'a,
    F: Fn(&T) -> bool,
{
    rows.values().filter(|row| keep(row)).cloned().collect()
}

#[async_trait]
impl TenantStore for MemoryDatabase {
    async fn register_practice(&self, tenant: NewTenant, owner: NewUser) -> StoreResult<(Tenant, TenantUser)> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == owner.email) {
            return Err(DatabaseError::Conflict("user email already exists".to_string()));
        }

        let now = Utc::now();
        let tenant = Tenant {
            tenant_id: Uuid::new_v4(),
            practice_name: tenant.practice_name,
            status: TenantStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let user = User {
            user_id: Uuid::new_v4(),
            email: owner.email,
            first_name: owner.first_name,
            last_name: owner.last_name,
            password_hash: owner.password_hash,
            created_at: now,
        };
        let membership = Membership {
            user_id: user.user_id,
            tenant_id: tenant.tenant_id,
            role: "owner".to_string(),
            created_by: Some(user.user_id),
            updated_at: now,
        };

        let tenant_user = TenantUser::from_parts(&user, &membership);
        state.tenants.insert(tenant.tenant_id, tenant.clone());
        state.users.insert(user.user_id, user);
        state.memberships.insert(membership.user_id, membership);
        Ok((tenant, tenant_user))
    }

    async fn get_tenant(&self, tenant_id: Uuid) -> StoreResult<Option<Tenant>> {
        Ok(self.state.read().await.tenants.get(&tenant_id).cloned())
    }

    async fn list_tenants(&self) -> StoreResult<Vec<Tenant>> {
        let state = self.state.read().await;
        let mut tenants: Vec<Tenant> = state.tenants.values().cloned().collect();
        tenants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tenants)
    }

    async fn set_tenant_status(&self, tenant_id: Uuid, status: TenantStatus) -> StoreResult<Tenant> {
        let mut state = self.state.write().await;
        let tenant = state
            .tenants
            .get_mut(&tenant_id)
            .ok_or_else(|| not_found("tenant", tenant_id))?;
        tenant.status = status;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }
}

#[async_trait]
impl UserStore for MemoryDatabase {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("user email already exists".to_string()));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn get_membership(&self, user_id: Uuid) -> StoreResult<Option<Membership>> {
        Ok(self.state.read().await.memberships.get(&user_id).cloned())
    }

    async fn upsert_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        role: &str,
        acting_user: Uuid,
    ) -> StoreResult<Membership> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(not_found("user", user_id));
        }
        let membership = Membership {
            user_id,
            tenant_id,
            role: role.to_string(),
            created_by: Some(acting_user),
            updated_at: Utc::now(),
        };
        state.memberships.insert(user_id, membership.clone());
        Ok(membership)
    }

    async fn list_tenant_users(&self, tenant_id: Uuid) -> StoreResult<Vec<TenantUser>> {
        let state = self.state.read().await;
        let mut users: Vec<TenantUser> = state
            .memberships
            .values()
            .filter(|m| m.tenant_id == tenant_id)
            .filter_map(|m| state.users.get(&m.user_id).map(|u| TenantUser::from_parts(u, m)))
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}

#[async_trait]
impl RoleStore for MemoryDatabase {
    async fn list_roles(&self, tenant_id: Uuid) -> StoreResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles = tenant_rows(&state.roles, |r| r.tenant_id == tenant_id);
        roles.sort_by(|a, b| a.role_name.cmp(&b.role_name));
        Ok(roles)
    }

    async fn get_role(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.get(&id).filter(|r| r.tenant_id == tenant_id).cloned())
    }

    async fn insert_role(&self, role: NewRole) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        let taken = state
            .roles
            .values()
            .any(|r| r.tenant_id == role.tenant_id && r.role_name == role.role_name);
        if taken {
            return Err(DatabaseError::Conflict("role name already exists".to_string()));
        }
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            tenant_id: role.tenant_id,
            role_name: role.role_name,
            role_description: role.role_description,
            is_default: false,
            created_by: Some(role.created_by),
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn rename_role(&self, tenant_id: Uuid, id: Uuid, role_name: &str) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        let taken = state
            .roles
            .values()
            .any(|r| r.tenant_id == tenant_id && r.id != id && r.role_name == role_name);
        if taken {
            return Err(DatabaseError::Conflict("role name already exists".to_string()));
        }
        let role = state
            .roles
            .get_mut(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .ok_or_else(|| not_found("role", id))?;
        role.role_name = role_name.to_string();
        role.updated_at = Utc::now();
        Ok(role.clone())
    }

    async fn delete_role(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.roles.get(&id) {
            Some(role) if role.tenant_id == tenant_id => {
                state.roles.remove(&id);
                Ok(())
            }
            _ => Err(not_found("role", id)),
        }
    }
}

#[async_trait]
impl PagePermissionStore for MemoryDatabase {
    async fn list_page_permissions(&self, tenant_id: Uuid) -> StoreResult<Vec<PagePermission>> {
        let state = self.state.read().await;
        let mut pages = tenant_rows(&state.page_permissions, |p| p.tenant_id == tenant_id);
        pages.sort_by(|a, b| a.page_path.cmp(&b.page_path));
        Ok(pages)
    }

    async fn find_page_permission(&self, tenant_id: Uuid, page_path: &str) -> StoreResult<Option<PagePermission>> {
        let state = self.state.read().await;
        Ok(state
            .page_permissions
            .values()
            .find(|p| p.tenant_id == tenant_id && p.page_path == page_path)
            .cloned())
    }

    async fn insert_page_permission(
        &self,
        tenant_id: Uuid,
        input: NewPagePermission,
        acting_user: Uuid,
    ) -> StoreResult<PagePermission> {
        let mut state = self.state.write().await;
        let taken = state
            .page_permissions
            .values()
            .any(|p| p.tenant_id == tenant_id && p.page_path == input.page_path);
        if taken {
            return Err(DatabaseError::Conflict("page permission already exists".to_string()));
        }
        let now = Utc::now();
        let page = PagePermission {
            id: Uuid::new_v4(),
            tenant_id,
            page_path: input.page_path,
            page_name: input.page_name,
            component_name: input.component_name,
            roles: input.roles,
            updated_by: Some(acting_user),
            created_at: now,
            updated_at: now,
        };
        state.page_permissions.insert(page.id, page.clone());
        Ok(page)
    }

    async fn set_page_roles(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        roles: &[String],
        acting_user: Uuid,
    ) -> StoreResult<PagePermission> {
        let mut state = self.state.write().await;
        let page = state
            .page_permissions
            .get_mut(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| not_found("page permission", id))?;
        page.roles = roles.to_vec();
        page.updated_by = Some(acting_user);
        page.updated_at = Utc::now();
        Ok(page.clone())
    }
}

#[async_trait]
impl ClientStore for MemoryDatabase {
    async fn insert_client(&self, tenant_id: Uuid, input: ClientInput, acting_user: Uuid) -> StoreResult<Client> {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            tenant_id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            created_by: acting_user,
            updated_by: acting_user,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn list_clients(&self, tenant_id: Uuid) -> StoreResult<Vec<Client>> {
        let state = self.state.read().await;
        let mut clients = tenant_rows(&state.clients, |c| c.tenant_id == tenant_id);
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    async fn get_client(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Client>> {
        let state = self.state.read().await;
        Ok(state.clients.get(&id).filter(|c| c.tenant_id == tenant_id).cloned())
    }

    async fn update_client(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: ClientInput,
        acting_user: Uuid,
    ) -> StoreResult<Client> {
        let mut state = self.state.write().await;
        let client = state
            .clients
            .get_mut(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .ok_or_else(|| not_found("client", id))?;
        client.name = input.name;
        client.email = input.email;
        client.phone = input.phone;
        client.address = input.address;
        client.updated_by = acting_user;
        client.updated_at = Utc::now();
        Ok(client.clone())
    }

    async fn delete_client(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.clients.get(&id) {
            Some(c) if c.tenant_id == tenant_id => {
                state.clients.remove(&id);
                Ok(())
            }
            _ => Err(not_found("client", id)),
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryDatabase {
    async fn insert_resource(&self, resource: NewResource) -> StoreResult<Resource> {
        let now = Utc::now();
        let resource = Resource {
            id: Uuid::new_v4(),
            tenant_id: resource.tenant_id,
            client_id: resource.client_id,
            resource_type: resource.resource_type,
            title: resource.title,
            description: resource.description,
            file_path: resource.file_path,
            file_size: resource.file_size,
            mime_type: resource.mime_type,
            url: resource.url,
            is_active: true,
            created_by: resource.created_by,
            updated_by: resource.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn list_active_resources(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Resource>> {
        let state = self.state.read().await;
        let mut resources = tenant_rows(&state.resources, |r| {
            r.tenant_id == tenant_id && r.client_id == client_id && r.is_active
        });
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resources)
    }

    async fn get_resource(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Resource>> {
        let state = self.state.read().await;
        Ok(state.resources.get(&id).filter(|r| r.tenant_id == tenant_id).cloned())
    }

    async fn deactivate_resource(&self, tenant_id: Uuid, id: Uuid, acting_user: Uuid) -> StoreResult<Resource> {
        let mut state = self.state.write().await;
        let resource = state
            .resources
            .get_mut(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .ok_or_else(|| not_found("resource", id))?;
        resource.is_active = false;
        resource.updated_by = acting_user;
        resource.updated_at = Utc::now();
        Ok(resource.clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryDatabase {
    async fn insert_document(&self, document: NewDocument) -> StoreResult<Document> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            tenant_id: document.tenant_id,
            client_id: document.client_id,
            title: document.title,
            description: document.description,
            file_path: document.file_path,
            file_size: document.file_size,
            mime_type: document.mime_type,
            created_by: document.created_by,
            updated_by: document.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn list_documents(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> StoreResult<Vec<Document>> {
        let state = self.state.read().await;
        let mut documents = tenant_rows(&state.documents, |d| {
            d.tenant_id == tenant_id && (client_id.is_none() || d.client_id == client_id)
        });
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn get_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Document>> {
        let state = self.state.read().await;
        Ok(state.documents.get(&id).filter(|d| d.tenant_id == tenant_id).cloned())
    }

    async fn delete_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.documents.get(&id) {
            Some(d) if d.tenant_id == tenant_id => {
                state.documents.remove(&id);
                Ok(())
            }
            _ => Err(not_found("document", id)),
        }
    }
}

#[async_trait]
impl ClinicalStore for MemoryDatabase {
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            tenant_id: session.tenant_id,
            client_id: session.client_id,
            scheduled_at: session.scheduled_at,
            duration_minutes: session.duration_minutes,
            session_type: session.session_type,
            status: SessionStatus::Scheduled,
            video_room_sid: None,
            created_by: session.created_by,
            updated_by: session.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn list_sessions(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Session>> {
        let state = self.state.read().await;
        let mut sessions = tenant_rows(&state.sessions, |s| s.tenant_id == tenant_id && s.client_id == client_id);
        sessions.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(sessions)
    }

    async fn get_session(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Session>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(&id).filter(|s| s.tenant_id == tenant_id).cloned())
    }

    async fn update_session_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: SessionStatus,
        acting_user: Uuid,
    ) -> StoreResult<Session> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .ok_or_else(|| not_found("session", id))?;
        session.status = status;
        session.updated_by = acting_user;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn set_session_room(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        room_sid: Option<String>,
        acting_user: Uuid,
    ) -> StoreResult<Session> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .ok_or_else(|| not_found("session", id))?;
        session.video_room_sid = room_sid;
        session.updated_by = acting_user;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn insert_note(&self, note: NewSessionNote) -> StoreResult<SessionNote> {
        let now = Utc::now();
        let note = SessionNote {
            id: Uuid::new_v4(),
            tenant_id: note.tenant_id,
            client_id: note.client_id,
            session_id: note.session_id,
            template_type: note.template_type,
            content: note.content,
            created_by: note.created_by,
            updated_by: note.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn list_notes(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<SessionNote>> {
        let state = self.state.read().await;
        let mut notes = tenant_rows(&state.notes, |n| n.tenant_id == tenant_id && n.client_id == client_id);
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn get_note(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<SessionNote>> {
        let state = self.state.read().await;
        Ok(state.notes.get(&id).filter(|n| n.tenant_id == tenant_id).cloned())
    }

    async fn update_note(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        content: NoteContent,
        acting_user: Uuid,
    ) -> StoreResult<SessionNote> {
        let mut state = self.state.write().await;
        let note = state
            .notes
            .get_mut(&id)
            .filter(|n| n.tenant_id == tenant_id)
            .ok_or_else(|| not_found("note", id))?;
        note.content = content;
        note.updated_by = acting_user;
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete_note(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.notes.get(&id) {
            Some(n) if n.tenant_id == tenant_id => {
                state.notes.remove(&id);
                Ok(())
            }
            _ => Err(not_found("note", id)),
        }
    }

    async fn insert_homework(&self, homework: NewHomework) -> StoreResult<Homework> {
        let now = Utc::now();
        let homework = Homework {
            id: Uuid::new_v4(),
            tenant_id: homework.tenant_id,
            client_id: homework.client_id,
            title: homework.title,
            description: homework.description,
            due_date: homework.due_date,
            status: HomeworkStatus::Assigned,
            created_by: homework.created_by,
            updated_by: homework.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.homework.insert(homework.id, homework.clone());
        Ok(homework)
    }

    async fn list_homework(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Homework>> {
        let state = self.state.read().await;
        let mut homework = tenant_rows(&state.homework, |h| h.tenant_id == tenant_id && h.client_id == client_id);
        homework.sort_by(|a, b| due_date_key(a.due_date).cmp(&due_date_key(b.due_date)));
        Ok(homework)
    }

    async fn set_homework_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: HomeworkStatus,
        acting_user: Uuid,
    ) -> StoreResult<Homework> {
        let mut state = self.state.write().await;
        let homework = state
            .homework
            .get_mut(&id)
            .filter(|h| h.tenant_id == tenant_id)
            .ok_or_else(|| not_found("homework", id))?;
        homework.status = status;
        homework.updated_by = acting_user;
        homework.updated_at = Utc::now();
        Ok(homework.clone())
    }

    async fn delete_homework(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.homework.get(&id) {
            Some(h) if h.tenant_id == tenant_id => {
                state.homework.remove(&id);
                Ok(())
            }
            _ => Err(not_found("homework", id)),
        }
    }

    async fn list_goals(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Goal>> {
        let state = self.state.read().await;
        let mut goals = tenant_rows(&state.goals, |g| g.tenant_id == tenant_id && g.client_id == client_id);
        goals.sort_by_key(|g| g.position);
        Ok(goals)
    }

    async fn replace_goals(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
        goals: Vec<GoalInput>,
        acting_user: Uuid,
    ) -> StoreResult<Vec<Goal>> {
        let mut state = self.state.write().await;
        state
            .goals
            .retain(|_, g| !(g.tenant_id == tenant_id && g.client_id == client_id));

        let now = Utc::now();
        let mut saved = Vec::with_capacity(goals.len());
        for (position, input) in goals.into_iter().enumerate() {
            let goal = Goal {
                id: Uuid::new_v4(),
                tenant_id,
                client_id,
                description: input.description,
                target_date: input.target_date,
                status: input.status,
                position: position as i32,
                created_by: acting_user,
                created_at: now,
                updated_at: now,
            };
            state.goals.insert(goal.id, goal.clone());
            saved.push(goal);
        }
        Ok(saved)
    }
}

#[async_trait]
impl SettingsStore for MemoryDatabase {
    async fn get_branding(&self, tenant_id: Uuid) -> StoreResult<Option<Branding>> {
        Ok(self.state.read().await.branding.get(&tenant_id).cloned())
    }

    async fn upsert_branding(&self, branding: Branding) -> StoreResult<Branding> {
        let mut branding = branding;
        branding.updated_at = Some(Utc::now());
        self.state.write().await.branding.insert(branding.tenant_id, branding.clone());
        Ok(branding)
    }

    async fn get_template_settings(&self, tenant_id: Uuid) -> StoreResult<Option<TemplateSettings>> {
        Ok(self.state.read().await.template_settings.get(&tenant_id).cloned())
    }

    async fn upsert_template_settings(&self, settings: TemplateSettings) -> StoreResult<TemplateSettings> {
        let mut settings = settings;
        settings.updated_at = Some(Utc::now());
        self.state
            .write()
            .await
            .template_settings
            .insert(settings.tenant_id, settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ResourceType;

    fn new_role(tenant_id: Uuid, name: &str) -> NewRole {
        NewRole {
            tenant_id,
            role_name: name.to_string(),
            role_description: String::new(),
            created_by: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn role_names_are_unique_per_tenant_only() {
        let db = MemoryDatabase::new();
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());

        db.insert_role(new_role(t1, "biller")).await.unwrap();
        db.insert_role(new_role(t2, "biller")).await.unwrap();
        let dup = db.insert_role(new_role(t1, "biller")).await;

        assert!(matches!(dup, Err(DatabaseError::Conflict(_))));
        assert_eq!(db.list_roles(t1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rows_of_other_tenants_are_invisible() {
        let db = MemoryDatabase::new();
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let user = Uuid::new_v4();
        let client = db
            .insert_client(t1, ClientInput { name: "Ada".into(), ..Default::default() }, user)
            .await
            .unwrap();

        assert!(db.get_client(t2, client.id).await.unwrap().is_none());
        assert!(db.delete_client(t2, client.id).await.is_err());
        assert!(db.get_client(t1, client.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deactivated_resources_drop_out_of_listing() {
        let db = MemoryDatabase::new();
        let (tenant, client, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let resource = db
            .insert_resource(NewResource {
                tenant_id: tenant,
                client_id: client,
                resource_type: ResourceType::Url,
                title: "Breathing".into(),
                description: None,
                file_path: None,
                file_size: None,
                mime_type: None,
                url: Some("https://example.com".into()),
                created_by: user,
            })
            .await
            .unwrap();

        db.deactivate_resource(tenant, resource.id, user).await.unwrap();

        assert!(db.list_active_resources(tenant, client).await.unwrap().is_empty());
        let stored = db.get_resource(tenant, resource.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn replacing_goals_keeps_submitted_order() {
        let db = MemoryDatabase::new();
        let (tenant, client, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let goal = |d: &str| GoalInput {
            description: d.to_string(),
            target_date: None,
            status: Default::default(),
        };

        db.replace_goals(tenant, client, vec![goal("sleep"), goal("walk")], user).await.unwrap();
        db.replace_goals(tenant, client, vec![goal("journal")], user).await.unwrap();

        let goals = db.list_goals(tenant, client).await.unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].description, "journal");
        assert_eq!(goals[0].position, 0);
    }
}
