use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::{Goal, GoalInput};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::TenantContext;

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
) -> ApiResult<Vec<Goal>> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::success(state.clinical.list_goals(&ctx, client_id).await?))
}

/// PUT /clients/:id/goals - replaces the whole list
pub async fn replace(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
    Json(goals): Json<Vec<GoalInput>>,
) -> ApiResult<Vec<Goal>> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::success(state.clinical.upsert_client_goals(&ctx, client_id, goals).await?))
}
