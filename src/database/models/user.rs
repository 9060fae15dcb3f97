use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity record. Email is unique across the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
}

/// A user together with their tenant role assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantUser {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub tenant_id: Uuid,
    /// False until the invited user sets a password
    pub has_password: bool,
}

impl TenantUser {
    pub fn from_parts(user: &User, membership: &Membership) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: membership.role.clone(),
            tenant_id: membership.tenant_id,
            has_password: user.password_hash.is_some(),
        }
    }
}

/// User-to-tenant role association. A user belongs to exactly one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: String,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
