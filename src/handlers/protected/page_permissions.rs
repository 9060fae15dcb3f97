use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::{NewPagePermission, PagePermission};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::TenantContext;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub role: String,
    /// Roles the caller currently sees for the page
    #[serde(default)]
    pub current_roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub page_path: String,
    /// Defaults to the caller's role
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessCheck {
    pub page_path: String,
    pub role: String,
    pub allowed: bool,
    pub roles: Vec<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Vec<PagePermission>> {
    Ok(ApiResponse::success(state.roles.list_page_permissions(&ctx).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<NewPagePermission>,
) -> ApiResult<PagePermission> {
    Ok(ApiResponse::created(state.roles.create_page_permission(&ctx, payload).await?))
}

/// POST /page-permissions/:id/toggle - returns the page's new role set
pub async fn toggle(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(payload): Json<ToggleRequest>,
) -> ApiResult<Vec<String>> {
    let id = parse_uuid(&id, "page")?;
    let roles = state
        .roles
        .update_page_permissions(&ctx, id, &payload.role, &payload.current_roles)
        .await?;
    Ok(ApiResponse::success(roles))
}

/// GET /page-permissions/check?page_path=/clients[&role=admin]
pub async fn check(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<CheckQuery>,
) -> ApiResult<AccessCheck> {
    let role = query.role.unwrap_or_else(|| ctx.role.clone());
    let roles = state.roles.effective_roles(&ctx, &query.page_path).await?;
    let allowed = state.roles.can_access(&ctx, &query.page_path, &role).await?;

    Ok(ApiResponse::success(AccessCheck {
        page_path: query.page_path,
        role,
        allowed,
        roles,
    }))
}
