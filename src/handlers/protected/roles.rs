use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::{Role, RoleEntry};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::TenantContext;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role_name: String,
    #[serde(default)]
    pub role_description: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub role_name: String,
}

/// GET /roles - base roles then custom roles
pub async fn list(State(state): State<AppState>, Extension(ctx): Extension<TenantContext>) -> ApiResult<Vec<RoleEntry>> {
    Ok(ApiResponse::success(state.roles.list_roles(&ctx).await?))
}

/// GET /roles/available
pub async fn available(State(state): State<AppState>, Extension(ctx): Extension<TenantContext>) -> ApiResult<Vec<String>> {
    Ok(ApiResponse::success(state.roles.available_roles(&ctx).await?))
}

/// GET /roles/assignable - roles offered when adding a user
pub async fn assignable(State(state): State<AppState>, Extension(ctx): Extension<TenantContext>) -> ApiResult<Vec<String>> {
    Ok(ApiResponse::success(state.roles.assignable_roles(&ctx).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<RoleRequest>,
) -> ApiResult<Role> {
    let role = state
        .roles
        .add_role(&ctx, &payload.role_name, &payload.role_description)
        .await?;
    Ok(ApiResponse::created(role))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> ApiResult<Role> {
    let id = parse_uuid(&id, "role")?;
    Ok(ApiResponse::success(state.roles.update_role(&ctx, id, &payload.role_name).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_uuid(&id, "role")?;
    state.roles.delete_role(&ctx, id).await?;
    Ok(ApiResponse::no_content())
}
