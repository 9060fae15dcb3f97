// handlers/public/auth/register.rs - POST /auth/register

use axum::{extract::State, Json};

use super::{issue_token, TokenResponse};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tenant_service::RegisterPracticeInput;

/// Creates a practice with its owner account and returns the owner's token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPracticeInput>,
) -> ApiResult<TokenResponse> {
    let (tenant, owner) = state.tenants.register_practice(payload).await?;
    Ok(ApiResponse::created(issue_token(&state, owner, tenant)?))
}
