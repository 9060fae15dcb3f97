use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::{Session, SessionStatus};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::clinical_service::CreateSessionInput;
use crate::types::TenantContext;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: SessionStatus,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
) -> ApiResult<Vec<Session>> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::success(state.clinical.list_sessions(&ctx, client_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
    Json(payload): Json<CreateSessionInput>,
) -> ApiResult<Session> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::created(state.clinical.create_session(&ctx, client_id, payload).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<Session> {
    let id = parse_uuid(&id, "session")?;
    Ok(ApiResponse::success(state.clinical.get_session(&ctx, id).await?))
}

/// PATCH /sessions/:id - `{"status": "completed"}`
pub async fn update_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Session> {
    let id = parse_uuid(&id, "session")?;
    let session = state.clinical.update_session_status(&ctx, id, payload.status).await?;
    Ok(ApiResponse::success(session))
}
