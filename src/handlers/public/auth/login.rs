// handlers/public/auth/login.rs - POST /auth/login

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{issue_token, TokenResponse};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Exchanges credentials for a JWT. Unknown email and wrong password give the same 401.
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> ApiResult<TokenResponse> {
    let (user, tenant) = state.tenants.authenticate(&payload.email, &payload.password).await?;
    tracing::info!("User {} logged in to tenant {}", user.user_id, tenant.tenant_id);

    Ok(ApiResponse::success(issue_token(&state, user, tenant)?))
}
