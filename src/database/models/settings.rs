use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::TemplateType;

/// Practice branding shown on client-facing pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    pub tenant_id: Uuid,
    pub display_name: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Branding {
    pub fn default_for(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            display_name: None,
            primary_color: None,
            secondary_color: None,
            logo_url: None,
            updated_by: None,
            updated_at: None,
        }
    }
}

/// Which note templates a practice uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    pub tenant_id: Uuid,
    pub default_template: TemplateType,
    pub enabled_templates: Vec<TemplateType>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TemplateSettings {
    pub fn default_for(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            default_template: TemplateType::FreeForm,
            enabled_templates: TemplateType::ALL.to_vec(),
            updated_by: None,
            updated_at: None,
        }
    }
}
