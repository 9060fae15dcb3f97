use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::{NoteContent, SessionNote};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::clinical_service::CreateNoteInput;
use crate::types::TenantContext;

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub content: NoteContent,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
) -> ApiResult<Vec<SessionNote>> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::success(state.clinical.list_notes(&ctx, client_id).await?))
}

/// POST /clients/:id/notes - template defaults to the practice's default template
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
    Json(payload): Json<CreateNoteInput>,
) -> ApiResult<SessionNote> {
    let client_id = parse_uuid(&client_id, "client")?;
    Ok(ApiResponse::created(state.clinical.create_note(&ctx, client_id, payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNoteRequest>,
) -> ApiResult<SessionNote> {
    let id = parse_uuid(&id, "note")?;
    Ok(ApiResponse::success(state.clinical.update_note(&ctx, id, payload.content).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_uuid(&id, "note")?;
    state.clinical.delete_note(&ctx, id).await?;
    Ok(ApiResponse::no_content())
}
