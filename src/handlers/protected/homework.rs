use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::{Homework, HomeworkStatus};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::clinical_service::HomeworkInput;
use crate::types::TenantContext;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: HomeworkStatus,
}

/// GET /clients/:id/homework - earliest due date first, undated last
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
) -> ApiResult<Vec<Homework>> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::success(state.clinical.list_homework(&ctx, client_id).await?))
}

pub async fn assign(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
    Json(payload): Json<HomeworkInput>,
) -> ApiResult<Homework> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::created(state.clinical.assign_homework(&ctx, client_id, payload).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Homework> {
    let id = parse_uuid(&id, "homework")?;
    let homework = state.clinical.set_homework_status(&ctx, id, payload.status).await?;
    Ok(ApiResponse::success(homework))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_uuid(&id, "homework")?;
    state.clinical.delete_homework(&ctx, id).await?;
    Ok(ApiResponse::no_content())
}
