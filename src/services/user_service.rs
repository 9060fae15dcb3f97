use std::sync::Arc;

use tracing::info;

use crate::database::models::{BaseRole, NewUser, TenantUser};
use crate::database::{RoleStore, UserStore};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::role_service::{get_user_dropdown_roles, require_administrator};
use crate::types::TenantContext;

/// Input of the add-user workflow, before trimming
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AddUserInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self { users, roles }
    }

    pub async fn list_users(&self, ctx: &TenantContext) -> ServiceResult<Vec<TenantUser>> {
        Ok(self.users.list_tenant_users(ctx.tenant_id).await?)
    }

    /// Adds a user to the caller's tenant by email, creating the identity when
    /// it does not exist yet. The membership is written on every call.
    pub async fn add_user(&self, ctx: &TenantContext, input: AddUserInput) -> ServiceResult<TenantUser> {
        let input = validate_add_user(input)?;
        require_administrator(ctx)?;

        let custom: Vec<String> = self
            .roles
            .list_roles(ctx.tenant_id)
            .await?
            .into_iter()
            .map(|r| r.role_name)
            .collect();
        if !get_user_dropdown_roles(&custom).contains(&input.role) {
            return Err(ServiceError::validation(format!("Role '{}' cannot be assigned", input.role)));
        }

        let user = match self.users.find_user_by_email(&input.email).await? {
            Some(user) => {
                if let Some(membership) = self.users.get_membership(user.user_id).await? {
                    if membership.tenant_id != ctx.tenant_id {
                        return Err(ServiceError::Conflict("User belongs to another practice".to_string()));
                    }
                    if membership.role == BaseRole::Owner.as_str() {
                        return Err(ServiceError::Conflict("The practice owner's role cannot be changed".to_string()));
                    }
                }
                user
            }
            None => {
                let user = self
                    .users
                    .create_user(NewUser {
                        email: input.email.clone(),
                        first_name: input.first_name.clone(),
                        last_name: input.last_name.clone(),
                        password_hash: None,
                    })
                    .await?;
                info!("Created invited user {}", user.user_id);
                user
            }
        };

        let membership = self
            .users
            .upsert_membership(user.user_id, ctx.tenant_id, &input.role, ctx.user_id)
            .await?;

        info!(
            "Assigned role '{}' to user {} in tenant {}",
            membership.role, user.user_id, ctx.tenant_id
        );
        Ok(TenantUser::from_parts(&user, &membership))
    }
}

/// Trims every field and rejects missing values or an email without `@`
pub fn validate_add_user(input: AddUserInput) -> ServiceResult<AddUserInput> {
    let input = AddUserInput {
        email: input.email.trim().to_lowercase(),
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        role: input.role.trim().to_string(),
    };

    if input.email.is_empty() || input.first_name.is_empty() || input.last_name.is_empty() {
        return Err(ServiceError::validation("Email, first name and last name are required"));
    }
    if input.role.is_empty() {
        return Err(ServiceError::validation("Role is required"));
    }
    if !input.email.contains('@') {
        return Err(ServiceError::validation("Invalid email address"));
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseError;
    use crate::database::models::{Membership, NewRole, Role, User};
    use crate::database::{MemoryDatabase, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Counts every store call and fails them all
    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn hit<T>(&self) -> StoreResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DatabaseError::QueryError("unexpected call".into()))
        }
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn find_user_by_email(&self, _: &str) -> StoreResult<Option<User>> {
            self.hit()
        }
        async fn get_user(&self, _: Uuid) -> StoreResult<Option<User>> {
            self.hit()
        }
        async fn create_user(&self, _: NewUser) -> StoreResult<User> {
            self.hit()
        }
        async fn get_membership(&self, _: Uuid) -> StoreResult<Option<Membership>> {
            self.hit()
        }
        async fn upsert_membership(&self, _: Uuid, _: Uuid, _: &str, _: Uuid) -> StoreResult<Membership> {
            self.hit()
        }
        async fn list_tenant_users(&self, _: Uuid) -> StoreResult<Vec<TenantUser>> {
            self.hit()
        }
    }

    #[async_trait]
    impl RoleStore for CountingStore {
        async fn list_roles(&self, _: Uuid) -> StoreResult<Vec<Role>> {
            self.hit()
        }
        async fn get_role(&self, _: Uuid, _: Uuid) -> StoreResult<Option<Role>> {
            self.hit()
        }
        async fn insert_role(&self, _: NewRole) -> StoreResult<Role> {
            self.hit()
        }
        async fn rename_role(&self, _: Uuid, _: Uuid, _: &str) -> StoreResult<Role> {
            self.hit()
        }
        async fn delete_role(&self, _: Uuid, _: Uuid) -> StoreResult<()> {
            self.hit()
        }
    }

    fn input(email: &str, role: &str) -> AddUserInput {
        AddUserInput {
            email: email.to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            role: role.to_string(),
        }
    }

    fn admin(tenant_id: Uuid) -> TenantContext {
        TenantContext::new(tenant_id, Uuid::new_v4(), "admin@clinic.test", "admin")
    }

    #[tokio::test]
    async fn malformed_email_fails_before_any_store_call() {
        let store = Arc::new(CountingStore::default());
        let service = UserService::new(store.clone(), store.clone());

        let err = service
            .add_user(&admin(Uuid::new_v4()), input("not-an-email", "admin"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_names_are_rejected() {
        let mut missing = input("a@b.c", "admin");
        missing.first_name = "  ".into();
        assert!(validate_add_user(missing).is_err());
        assert!(validate_add_user(input("a@b.c", " ")).is_err());
    }

    #[tokio::test]
    async fn creates_identity_once_and_updates_membership_each_call() {
        let db = Arc::new(MemoryDatabase::new());
        let service = UserService::new(db.clone(), db.clone());
        let ctx = admin(Uuid::new_v4());

        let first = service.add_user(&ctx, input(" Pat@Clinic.test ", "practitioner")).await.unwrap();
        assert_eq!(first.email, "pat@clinic.test");
        assert_eq!(first.role, "practitioner");
        assert!(!first.has_password);

        let second = service.add_user(&ctx, input("pat@clinic.test", "admin")).await.unwrap();
        assert_eq!(second.user_id, first.user_id);
        assert_eq!(second.role, "admin");

        let users = service.list_users(&ctx).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, "admin");
    }

    #[tokio::test]
    async fn owner_and_unknown_roles_cannot_be_assigned() {
        let db = Arc::new(MemoryDatabase::new());
        let service = UserService::new(db.clone(), db.clone());
        let ctx = admin(Uuid::new_v4());

        for role in ["owner", "biller"] {
            let err = service.add_user(&ctx, input("x@clinic.test", role)).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{role}");
        }
    }

    #[tokio::test]
    async fn users_of_other_practices_are_not_moved() {
        let db = Arc::new(MemoryDatabase::new());
        let service = UserService::new(db.clone(), db.clone());

        service.add_user(&admin(Uuid::new_v4()), input("shared@clinic.test", "admin")).await.unwrap();
        let err = service
            .add_user(&admin(Uuid::new_v4()), input("shared@clinic.test", "admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn the_owner_cannot_be_demoted() {
        let db = Arc::new(MemoryDatabase::new());
        let service = UserService::new(db.clone(), db.clone());
        let ctx = admin(Uuid::new_v4());

        let owner = db
            .create_user(NewUser {
                email: "owner@clinic.test".into(),
                first_name: "Olive".into(),
                last_name: "Reyes".into(),
                password_hash: None,
            })
            .await
            .unwrap();
        db.upsert_membership(owner.user_id, ctx.tenant_id, "owner", owner.user_id)
            .await
            .unwrap();

        let err = service
            .add_user(&ctx, input("owner@clinic.test", "practitioner"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let membership = db.get_membership(owner.user_id).await.unwrap().unwrap();
        assert_eq!(membership.role, "owner");
    }
}
