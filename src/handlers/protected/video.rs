use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::Session;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::video_service::VideoToken;
use crate::types::TenantContext;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: Uuid,
}

/// POST /video/rooms - opens (or reuses) the session's room
pub async fn create_room(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<Session> {
    Ok(ApiResponse::success(state.video.create_room(&ctx, payload.session_id).await?))
}

pub async fn end_room(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(session_id): Path<String>,
) -> ApiResult<Session> {
    let session_id = parse_uuid(&session_id, "session")?;
    Ok(ApiResponse::success(state.video.end_room(&ctx, session_id).await?))
}

/// POST /video/token - access token for the caller
pub async fn token(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<VideoToken> {
    Ok(ApiResponse::success(state.video.issue_token(&ctx, payload.session_id).await?))
}
