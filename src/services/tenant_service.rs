use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::database::models::{NewTenant, NewUser, Tenant, TenantStatus, TenantUser};
use crate::database::{DatabaseError, TenantStore, UserStore};
use crate::services::error::{ServiceError, ServiceResult};

const MIN_PASSWORD_LEN: usize = 8;
const INVALID_LOGIN: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPracticeInput {
    pub practice_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Tenant registry plus practice sign-up and login
#[derive(Clone)]
pub struct TenantService {
    tenants: Arc<dyn TenantStore>,
    users: Arc<dyn UserStore>,
}

impl TenantService {
    pub fn new(tenants: Arc<dyn TenantStore>, users: Arc<dyn UserStore>) -> Self {
        Self { tenants, users }
    }

    /// Creates an active tenant together with its owner account
    pub async fn register_practice(&self, input: RegisterPracticeInput) -> ServiceResult<(Tenant, TenantUser)> {
        let practice_name = input.practice_name.trim().to_string();
        let email = input.email.trim().to_lowercase();
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();

        let name_len = practice_name.chars().count();
        if !(2..=100).contains(&name_len) {
            return Err(ServiceError::validation("Practice name must be between 2 and 100 characters"));
        }
        if !email.contains('@') {
            return Err(ServiceError::validation("Invalid email address"));
        }
        if first_name.is_empty() || last_name.is_empty() {
            return Err(ServiceError::validation("First name and last name are required"));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&input.password).map_err(|e| ServiceError::Unknown(e.to_string()))?;
        let (tenant, owner) = self
            .tenants
            .register_practice(
                NewTenant { practice_name },
                NewUser {
                    email,
                    first_name,
                    last_name,
                    password_hash: Some(password_hash),
                },
            )
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => ServiceError::Conflict("Email is already registered".to_string()),
                other => other.into(),
            })?;

        info!("Registered practice '{}' ({})", tenant.practice_name, tenant.tenant_id);
        Ok((tenant, owner))
    }

    /// Checks credentials and that the user's practice is active
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<(TenantUser, Tenant)> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::validation("Email and password are required"));
        }

        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::Auth(INVALID_LOGIN.to_string()))?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| ServiceError::Auth(INVALID_LOGIN.to_string()))?;
        let matches = verify_password(password, hash).map_err(|e| {
            warn!("Stored password hash for {} is unreadable: {}", user.user_id, e);
            ServiceError::Auth(INVALID_LOGIN.to_string())
        })?;
        if !matches {
            return Err(ServiceError::Auth(INVALID_LOGIN.to_string()));
        }

        let membership = self
            .users
            .get_membership(user.user_id)
            .await?
            .ok_or_else(|| ServiceError::forbidden("User is not assigned to a practice"))?;
        let tenant = self.get_tenant(membership.tenant_id).await?;
        if !tenant.is_active() {
            return Err(ServiceError::forbidden("Practice is suspended"));
        }

        Ok((TenantUser::from_parts(&user, &membership), tenant))
    }

    pub async fn get_tenant(&self, tenant_id: Uuid) -> ServiceResult<Tenant> {
        self.tenants
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant not found"))
    }

    pub async fn list_tenants(&self) -> ServiceResult<Vec<Tenant>> {
        Ok(self.tenants.list_tenants().await?)
    }

    pub async fn set_status(&self, tenant_id: Uuid, status: TenantStatus) -> ServiceResult<Tenant> {
        let tenant = self.tenants.set_tenant_status(tenant_id, status).await?;
        info!("Tenant {} is now {}", tenant.tenant_id, tenant.status);
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDatabase;

    fn service() -> TenantService {
        let db = Arc::new(MemoryDatabase::new());
        TenantService::new(db.clone(), db)
    }

    fn input(email: &str) -> RegisterPracticeInput {
        RegisterPracticeInput {
            practice_name: "Harbor Counseling".into(),
            email: email.into(),
            first_name: "Olive".into(),
            last_name: "Owner".into(),
            password: "s3cure-pass".into(),
        }
    }

    #[tokio::test]
    async fn registration_creates_active_tenant_with_owner() {
        let service = service();
        let (tenant, owner) = service.register_practice(input("Olive@Harbor.test")).await.unwrap();

        assert!(tenant.is_active());
        assert_eq!(owner.role, "owner");
        assert_eq!(owner.tenant_id, tenant.tenant_id);
        assert_eq!(owner.email, "olive@harbor.test");

        let (user, logged_in) = service.authenticate("olive@harbor.test", "s3cure-pass").await.unwrap();
        assert_eq!(user.user_id, owner.user_id);
        assert_eq!(logged_in.tenant_id, tenant.tenant_id);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let service = service();
        service.register_practice(input("olive@harbor.test")).await.unwrap();
        let err = service.register_practice(input("olive@harbor.test")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(service.list_tenants().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn registration_input_is_validated() {
        let service = service();
        let mut short = input("a@b.test");
        short.practice_name = "X".into();
        assert!(matches!(service.register_practice(short).await, Err(ServiceError::Validation(_))));

        let mut weak = input("a@b.test");
        weak.password = "short".into();
        assert!(matches!(service.register_practice(weak).await, Err(ServiceError::Validation(_))));

        assert!(matches!(
            service.register_practice(input("no-at-sign")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_suspended_practice_are_refused() {
        let service = service();
        let (tenant, _) = service.register_practice(input("olive@harbor.test")).await.unwrap();

        let err = service.authenticate("olive@harbor.test", "nope-nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(ref m) if m == INVALID_LOGIN));

        service.set_status(tenant.tenant_id, TenantStatus::Suspended).await.unwrap();
        let err = service.authenticate("olive@harbor.test", "s3cure-pass").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
