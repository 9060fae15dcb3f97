use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{parse_text, PgDatabase};
use crate::database::manager::DatabaseError;
use crate::database::models::{Branding, TemplateSettings, TemplateType};
use crate::database::repository::{SettingsStore, StoreResult};

#[derive(FromRow)]
struct BrandingRow {
    tenant_id: Uuid,
    display_name: Option<String>,
    primary_color: Option<String>,
    secondary_color: Option<String>,
    logo_url: Option<String>,
    updated_by: Option<Uuid>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<BrandingRow> for Branding {
    fn from(row: BrandingRow) -> Self {
        Branding {
            tenant_id: row.tenant_id,
            display_name: row.display_name,
            primary_color: row.primary_color,
            secondary_color: row.secondary_color,
            logo_url: row.logo_url,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct TemplateSettingsRow {
    tenant_id: Uuid,
    default_template: String,
    enabled_templates: Vec<String>,
    updated_by: Option<Uuid>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TemplateSettingsRow> for TemplateSettings {
    type Error = DatabaseError;

    fn try_from(row: TemplateSettingsRow) -> Result<Self, Self::Error> {
        let enabled_templates = row
            .enabled_templates
            .iter()
            .map(|t| parse_text::<TemplateType>(t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TemplateSettings {
            tenant_id: row.tenant_id,
            default_template: parse_text(&row.default_template)?,
            enabled_templates,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
        })
    }
}

const BRANDING_COLUMNS: &str =
    "tenant_id, display_name, primary_color, secondary_color, logo_url, updated_by, updated_at";
const TEMPLATE_COLUMNS: &str = "tenant_id, default_template, enabled_templates, updated_by, updated_at";

#[async_trait]
impl SettingsStore for PgDatabase {
    async fn get_branding(&self, tenant_id: Uuid) -> StoreResult<Option<Branding>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, BrandingRow>(&format!(
            "SELECT {} FROM branding WHERE tenant_id = $1",
            BRANDING_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.map(Branding::from))
    }

    async fn upsert_branding(&self, branding: Branding) -> StoreResult<Branding> {
        let mut tx = self.manager.tenant_tx(branding.tenant_id).await?;
        let row = sqlx::query_as::<_, BrandingRow>(&format!(
            "INSERT INTO branding (tenant_id, display_name, primary_color, secondary_color, logo_url,
                                   updated_by, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, now())
             ON CONFLICT (tenant_id) DO UPDATE
                SET display_name = EXCLUDED.display_name,
                    primary_color = EXCLUDED.primary_color,
                    secondary_color = EXCLUDED.secondary_color,
                    logo_url = EXCLUDED.logo_url,
                    updated_by = EXCLUDED.updated_by,
                    updated_at = now()
             RETURNING {}",
            BRANDING_COLUMNS
        ))
        .bind(branding.tenant_id)
        .bind(&branding.display_name)
        .bind(&branding.primary_color)
        .bind(&branding.secondary_color)
        .bind(&branding.logo_url)
        .bind(branding.updated_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Branding::from(row))
    }

    async fn get_template_settings(&self, tenant_id: Uuid) -> StoreResult<Option<TemplateSettings>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, TemplateSettingsRow>(&format!(
            "SELECT {} FROM template_settings WHERE tenant_id = $1",
            TEMPLATE_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        row.map(TemplateSettings::try_from).transpose()
    }

    async fn upsert_template_settings(&self, settings: TemplateSettings) -> StoreResult<TemplateSettings> {
        let enabled: Vec<String> = settings
            .enabled_templates
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();

        let mut tx = self.manager.tenant_tx(settings.tenant_id).await?;
        let row = sqlx::query_as::<_, TemplateSettingsRow>(&format!(
            "INSERT INTO template_settings (tenant_id, default_template, enabled_templates, updated_by, updated_at)
             VALUES ($1, $2, $3, $4, now())
             ON CONFLICT (tenant_id) DO UPDATE
                SET default_template = EXCLUDED.default_template,
                    enabled_templates = EXCLUDED.enabled_templates,
                    updated_by = EXCLUDED.updated_by,
                    updated_at = now()
             RETURNING {}",
            TEMPLATE_COLUMNS
        ))
        .bind(settings.tenant_id)
        .bind(settings.default_template.as_str())
        .bind(&enabled)
        .bind(settings.updated_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        TemplateSettings::try_from(row)
    }
}
