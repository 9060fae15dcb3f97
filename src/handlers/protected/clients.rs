use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::utils::parse_uuid;
use crate::app::AppState;
use crate::database::models::{Client, ClientInput};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::TenantContext;

pub async fn list(State(state): State<AppState>, Extension(ctx): Extension<TenantContext>) -> ApiResult<Vec<Client>> {
    Ok(ApiResponse::success(state.clients.list_clients(&ctx).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<ClientInput>,
) -> ApiResult<Client> {
    Ok(ApiResponse::created(state.clients.create_client(&ctx, payload).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<Client> {
    let id = parse_uuid(&id, "client")?;
    Ok(ApiResponse::success(state.clients.get_client(&ctx, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(payload): Json<ClientInput>,
) -> ApiResult<Client> {
    let id = parse_uuid(&id, "client")?;
    Ok(ApiResponse::success(state.clients.update_client(&ctx, id, payload).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_uuid(&id, "client")?;
    state.clients.delete_client(&ctx, id).await?;
    Ok(ApiResponse::no_content())
}
