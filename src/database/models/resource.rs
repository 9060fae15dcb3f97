use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Url,
}

text_enum!(ResourceType, "resource type", {
    Document => "document",
    Url => "url",
});

/// Client-facing learning material: an uploaded file or an external link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub resource_type: ResourceType,
    pub title: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub url: Option<String>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub resource_type: ResourceType,
    pub title: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub url: Option<String>,
    pub created_by: Uuid,
}
