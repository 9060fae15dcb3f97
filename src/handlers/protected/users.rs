use axum::{extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::TenantUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::AddUserInput;
use crate::types::TenantContext;

/// GET /users
pub async fn list(State(state): State<AppState>, Extension(ctx): Extension<TenantContext>) -> ApiResult<Vec<TenantUser>> {
    Ok(ApiResponse::success(state.users.list_users(&ctx).await?))
}

/// POST /users - invite by email or move an existing user's membership to this practice
pub async fn add(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<AddUserInput>,
) -> ApiResult<TenantUser> {
    Ok(ApiResponse::created(state.users.add_user(&ctx, payload).await?))
}
