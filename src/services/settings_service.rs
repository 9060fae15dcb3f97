use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::database::models::{Branding, TemplateSettings, TemplateType};
use crate::database::SettingsStore;
use crate::events::{TemplateSettingsBus, TemplateSettingsChanged};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::role_service::require_administrator;
use crate::types::TenantContext;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandingInput {
    pub display_name: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSettingsInput {
    pub default_template: TemplateType,
    pub enabled_templates: Vec<TemplateType>,
}

/// `#RRGGBB`
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7 && value.starts_with('#') && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Clone)]
pub struct SettingsService {
    settings: Arc<dyn SettingsStore>,
    bus: TemplateSettingsBus,
}

impl SettingsService {
    pub fn new(settings: Arc<dyn SettingsStore>, bus: TemplateSettingsBus) -> Self {
        Self { settings, bus }
    }

    pub fn bus(&self) -> &TemplateSettingsBus {
        &self.bus
    }

    pub async fn get_branding(&self, ctx: &TenantContext) -> ServiceResult<Branding> {
        Ok(self
            .settings
            .get_branding(ctx.tenant_id)
            .await?
            .unwrap_or_else(|| Branding::default_for(ctx.tenant_id)))
    }

    pub async fn update_branding(&self, ctx: &TenantContext, input: BrandingInput) -> ServiceResult<Branding> {
        require_administrator(ctx)?;

        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let primary_color = clean(input.primary_color);
        let secondary_color = clean(input.secondary_color);
        for color in primary_color.iter().chain(secondary_color.iter()) {
            if !is_hex_color(color) {
                return Err(ServiceError::validation(format!("Invalid color '{}', expected #RRGGBB", color)));
            }
        }

        let logo_url = clean(input.logo_url);
        if let Some(logo) = &logo_url {
            if url::Url::parse(logo).is_err() {
                return Err(ServiceError::validation("Logo URL must be an absolute URL"));
            }
        }

        let branding = self
            .settings
            .upsert_branding(Branding {
                tenant_id: ctx.tenant_id,
                display_name: clean(input.display_name),
                primary_color,
                secondary_color,
                logo_url,
                updated_by: Some(ctx.user_id),
                updated_at: None,
            })
            .await?;

        info!("Updated branding for tenant {}", ctx.tenant_id);
        Ok(branding)
    }

    pub async fn get_template_settings(&self, ctx: &TenantContext) -> ServiceResult<TemplateSettings> {
        Ok(self
            .settings
            .get_template_settings(ctx.tenant_id)
            .await?
            .unwrap_or_else(|| TemplateSettings::default_for(ctx.tenant_id)))
    }

    /// Persists the settings and publishes a change event
    pub async fn update_template_settings(
        &self,
        ctx: &TenantContext,
        input: TemplateSettingsInput,
    ) -> ServiceResult<TemplateSettings> {
        require_administrator(ctx)?;

        let mut enabled: Vec<TemplateType> = Vec::with_capacity(input.enabled_templates.len());
        for template in input.enabled_templates {
            if !enabled.contains(&template) {
                enabled.push(template);
            }
        }
        if enabled.is_empty() {
            return Err(ServiceError::validation("At least one template must be enabled"));
        }
        if !enabled.contains(&input.default_template) {
            return Err(ServiceError::validation("Default template must be enabled"));
        }

        let settings = self
            .settings
            .upsert_template_settings(TemplateSettings {
                tenant_id: ctx.tenant_id,
                default_template: input.default_template,
                enabled_templates: enabled,
                updated_by: Some(ctx.user_id),
                updated_at: None,
            })
            .await?;

        self.bus.publish(TemplateSettingsChanged {
            tenant_id: ctx.tenant_id,
            settings: settings.clone(),
        });
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDatabase;
    use uuid::Uuid;

    fn setup() -> (SettingsService, TenantContext) {
        let service = SettingsService::new(Arc::new(MemoryDatabase::new()), TemplateSettingsBus::new());
        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), "o@clinic.test", "owner");
        (service, ctx)
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#1a2B3c"));
        assert!(!is_hex_color("1a2b3c"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#12345g"));
    }

    #[tokio::test]
    async fn branding_defaults_then_updates() {
        let (service, ctx) = setup();
        assert_eq!(service.get_branding(&ctx).await.unwrap(), Branding::default_for(ctx.tenant_id));

        let updated = service
            .update_branding(
                &ctx,
                BrandingInput {
                    display_name: Some("Harbor".into()),
                    primary_color: Some("#004466".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.primary_color.as_deref(), Some("#004466"));
        assert_eq!(updated.updated_by, Some(ctx.user_id));

        let bad = BrandingInput {
            secondary_color: Some("teal".into()),
            ..Default::default()
        };
        assert!(matches!(service.update_branding(&ctx, bad).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn template_update_is_published() {
        let (service, ctx) = setup();
        let mut rx = service.bus().subscribe();

        let saved = service
            .update_template_settings(
                &ctx,
                TemplateSettingsInput {
                    default_template: TemplateType::Soap,
                    enabled_templates: vec![TemplateType::Soap, TemplateType::Dap, TemplateType::Soap],
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.enabled_templates, vec![TemplateType::Soap, TemplateType::Dap]);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.tenant_id, ctx.tenant_id);
        assert_eq!(event.settings.default_template, TemplateType::Soap);
    }

    #[tokio::test]
    async fn default_template_must_be_enabled() {
        let (service, ctx) = setup();
        let mut rx = service.bus().subscribe();

        let err = service
            .update_template_settings(
                &ctx,
                TemplateSettingsInput {
                    default_template: TemplateType::Girp,
                    enabled_templates: vec![TemplateType::Soap],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(rx.try_recv().is_err());
    }
}
