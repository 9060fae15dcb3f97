use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text_enum;

/// Roles every tenant has without a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseRole {
    Owner,
    Admin,
    Practitioner,
}

text_enum!(BaseRole, "base role", {
    Owner => "owner",
    Admin => "admin",
    Practitioner => "practitioner",
});

impl BaseRole {
    pub fn is_base_name(name: &str) -> bool {
        BaseRole::ALL.iter().any(|r| r.as_str() == name)
    }
}

/// Tenant-defined custom role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub role_name: String,
    pub role_description: String,
    pub is_default: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub tenant_id: Uuid,
    pub role_name: String,
    pub role_description: String,
    pub created_by: Uuid,
}

/// Role as seen by callers: implicit base roles and stored custom roles
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RoleEntry {
    Base { role_name: String },
    Custom(Role),
}

impl RoleEntry {
    pub fn base(role: BaseRole) -> Self {
        RoleEntry::Base {
            role_name: role.as_str().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RoleEntry::Base { role_name } => role_name,
            RoleEntry::Custom(role) => &role.role_name,
        }
    }
}
