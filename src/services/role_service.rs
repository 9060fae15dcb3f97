//! Tenant role definitions and page-level access rules.
//!
//! Base roles (`owner`, `admin`, `practitioner`) exist implicitly in every
//! tenant and are merged with the tenant's stored custom roles at read time.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PagePolicy;
use crate::database::models::{BaseRole, NewPagePermission, NewRole, PagePermission, Role, RoleEntry};
use crate::database::{DatabaseError, PagePermissionStore, RoleStore};
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::TenantContext;

const ROLE_EXISTS: &str = "Role name already exists";

/// Base role names followed by custom names not already present, first-seen order
pub fn get_available_roles<S: AsRef<str>>(custom_roles: &[S]) -> Vec<String> {
    let mut roles: Vec<String> = BaseRole::ALL.iter().map(|r| r.as_str().to_string()).collect();
    for name in custom_roles {
        let name = name.as_ref();
        if !roles.iter().any(|r| r == name) {
            roles.push(name.to_string());
        }
    }
    roles
}

/// Roles an administrator may hand out. `owner` is never assignable.
pub fn get_user_dropdown_roles<S: AsRef<str>>(custom_roles: &[S]) -> Vec<String> {
    get_available_roles(custom_roles)
        .into_iter()
        .filter(|r| r != BaseRole::Owner.as_str())
        .collect()
}

/// Removes `role` when present, appends it otherwise
pub fn toggle_role(current_roles: &[String], role: &str) -> Vec<String> {
    if current_roles.iter().any(|r| r == role) {
        current_roles.iter().filter(|r| *r != role).cloned().collect()
    } else {
        let mut roles = current_roles.to_vec();
        roles.push(role.to_string());
        roles
    }
}

pub(crate) fn require_administrator(ctx: &TenantContext) -> ServiceResult<()> {
    if ctx.is_administrator() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Owner or admin role required"))
    }
}

fn role_conflict(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::Conflict(_) => ServiceError::Conflict(ROLE_EXISTS.to_string()),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleStore>,
    pages: Arc<dyn PagePermissionStore>,
    default_policy: PagePolicy,
}

impl RoleService {
    pub fn new(roles: Arc<dyn RoleStore>, pages: Arc<dyn PagePermissionStore>, default_policy: PagePolicy) -> Self {
        Self {
            roles,
            pages,
            default_policy,
        }
    }

    /// Base roles first, then custom roles by name
    pub async fn list_roles(&self, ctx: &TenantContext) -> ServiceResult<Vec<RoleEntry>> {
        let custom = self.roles.list_roles(ctx.tenant_id).await?;

        let mut entries: Vec<RoleEntry> = BaseRole::ALL.iter().copied().map(RoleEntry::base).collect();
        entries.extend(custom.into_iter().map(RoleEntry::Custom));
        Ok(entries)
    }

    pub async fn custom_role_names(&self, ctx: &TenantContext) -> ServiceResult<Vec<String>> {
        let custom = self.roles.list_roles(ctx.tenant_id).await?;
        Ok(custom.into_iter().map(|r| r.role_name).collect())
    }

    pub async fn available_roles(&self, ctx: &TenantContext) -> ServiceResult<Vec<String>> {
        Ok(get_available_roles(&self.custom_role_names(ctx).await?))
    }

    pub async fn assignable_roles(&self, ctx: &TenantContext) -> ServiceResult<Vec<String>> {
        Ok(get_user_dropdown_roles(&self.custom_role_names(ctx).await?))
    }

    pub async fn add_role(&self, ctx: &TenantContext, name: &str, description: &str) -> ServiceResult<Role> {
        require_administrator(ctx)?;
        let name = normalize_role_name(name)?;

        let existing = self.roles.list_roles(ctx.tenant_id).await?;
        if BaseRole::is_base_name(&name) || existing.iter().any(|r| r.role_name == name) {
            return Err(ServiceError::Conflict(ROLE_EXISTS.to_string()));
        }

        let role = self
            .roles
            .insert_role(NewRole {
                tenant_id: ctx.tenant_id,
                role_name: name,
                role_description: description.trim().to_string(),
                created_by: ctx.user_id,
            })
            .await
            .map_err(role_conflict)?;

        info!("Added role '{}' to tenant {}", role.role_name, ctx.tenant_id);
        Ok(role)
    }

    /// Renaming a role to its current name is not a conflict
    pub async fn update_role(&self, ctx: &TenantContext, id: Uuid, name: &str) -> ServiceResult<Role> {
        require_administrator(ctx)?;
        let name = normalize_role_name(name)?;

        let existing = self.roles.list_roles(ctx.tenant_id).await?;
        if !existing.iter().any(|r| r.id == id) {
            return Err(ServiceError::not_found("Role not found"));
        }
        if BaseRole::is_base_name(&name) || existing.iter().any(|r| r.role_name == name && r.id != id) {
            return Err(ServiceError::Conflict(ROLE_EXISTS.to_string()));
        }

        let role = self
            .roles
            .rename_role(ctx.tenant_id, id, &name)
            .await
            .map_err(role_conflict)?;

        info!("Renamed role {} to '{}'", id, role.role_name);
        Ok(role)
    }

    /// Users and page permissions that reference the role name are left untouched
    pub async fn delete_role(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<()> {
        require_administrator(ctx)?;
        self.roles.delete_role(ctx.tenant_id, id).await?;
        info!("Deleted role {} from tenant {}", id, ctx.tenant_id);
        Ok(())
    }

    pub async fn list_page_permissions(&self, ctx: &TenantContext) -> ServiceResult<Vec<PagePermission>> {
        Ok(self.pages.list_page_permissions(ctx.tenant_id).await?)
    }

    pub async fn create_page_permission(
        &self,
        ctx: &TenantContext,
        input: NewPagePermission,
    ) -> ServiceResult<PagePermission> {
        require_administrator(ctx)?;

        let page_path = input.page_path.trim().to_string();
        let page_name = input.page_name.trim().to_string();
        if page_path.is_empty() || page_name.is_empty() {
            return Err(ServiceError::validation("Page path and page name are required"));
        }

        let mut roles: Vec<String> = Vec::with_capacity(input.roles.len());
        for role in input.roles.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            if !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        }

        let input = NewPagePermission {
            page_path,
            page_name,
            component_name: input.component_name,
            roles,
        };
        let page = self
            .pages
            .insert_page_permission(ctx.tenant_id, input, ctx.user_id)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => ServiceError::Conflict("Page permission already exists".to_string()),
                other => other.into(),
            })?;

        Ok(page)
    }

    /// Toggles `role` in `current_roles` and persists the result as the page's allowed roles
    pub async fn update_page_permissions(
        &self,
        ctx: &TenantContext,
        page_id: Uuid,
        role: &str,
        current_roles: &[String],
    ) -> ServiceResult<Vec<String>> {
        require_administrator(ctx)?;
        let role = role.trim();
        if role.is_empty() {
            return Err(ServiceError::validation("Role name is required"));
        }

        let roles = toggle_role(current_roles, role);
        let page = self
            .pages
            .set_page_roles(ctx.tenant_id, page_id, &roles, ctx.user_id)
            .await?;

        debug!("Page {} now allows {:?}", page.page_path, page.roles);
        Ok(page.roles)
    }

    /// Role names allowed on `page_path`. `owner` is always included.
    pub async fn effective_roles(&self, ctx: &TenantContext, page_path: &str) -> ServiceResult<Vec<String>> {
        let owner = BaseRole::Owner.as_str();

        let mut roles = match self.pages.find_page_permission(ctx.tenant_id, page_path).await? {
            Some(page) => page.roles,
            None => match self.default_policy {
                PagePolicy::Allow => self.available_roles(ctx).await?,
                PagePolicy::Deny => Vec::new(),
            },
        };

        if !roles.iter().any(|r| r == owner) {
            roles.insert(0, owner.to_string());
        }
        Ok(roles)
    }

    pub async fn can_access(&self, ctx: &TenantContext, page_path: &str, role: &str) -> ServiceResult<bool> {
        if role == BaseRole::Owner.as_str() {
            return Ok(true);
        }
        let roles = self.effective_roles(ctx, page_path).await?;
        Ok(roles.iter().any(|r| r == role))
    }
}

fn normalize_role_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Role name is required"));
    }
    Ok(name.to_string())
}
