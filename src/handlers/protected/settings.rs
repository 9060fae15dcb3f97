use axum::{extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::{Branding, TemplateSettings};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::settings_service::{BrandingInput, TemplateSettingsInput};
use crate::types::TenantContext;

pub async fn branding(State(state): State<AppState>, Extension(ctx): Extension<TenantContext>) -> ApiResult<Branding> {
    Ok(ApiResponse::success(state.settings.get_branding(&ctx).await?))
}

pub async fn update_branding(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<BrandingInput>,
) -> ApiResult<Branding> {
    Ok(ApiResponse::success(state.settings.update_branding(&ctx, payload).await?))
}

pub async fn templates(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<TemplateSettings> {
    Ok(ApiResponse::success(state.settings.get_template_settings(&ctx).await?))
}

pub async fn update_templates(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<TemplateSettingsInput>,
) -> ApiResult<TemplateSettings> {
    Ok(ApiResponse::success(state.settings.update_template_settings(&ctx, payload).await?))
}
