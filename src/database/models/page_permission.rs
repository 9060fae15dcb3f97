use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which role names may access a page or component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePermission {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub page_path: String,
    pub page_name: String,
    pub component_name: Option<String>,
    pub roles: Vec<String>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPagePermission {
    pub page_path: String,
    pub page_name: String,
    pub component_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}
