// handlers/public/auth/mod.rs - token acquisition

pub mod login;
pub mod register;

pub use login::login;
pub use register::register;

use serde::Serialize;

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::database::models::{Tenant, TenantUser};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    /// Seconds
    pub expires_in: u64,
    pub user: TenantUser,
    pub tenant: Tenant,
}

pub(crate) fn issue_token(state: &AppState, user: TenantUser, tenant: Tenant) -> Result<TokenResponse, ApiError> {
    let expiry_hours = state.config.security.jwt_expiry_hours;
    let claims = Claims::new(&user, state.is_root_email(&user.email), expiry_hours);

    let token = generate_jwt(&claims, state.jwt_secret()).map_err(|e| {
        tracing::error!("Failed to sign token for {}: {}", user.user_id, e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    Ok(TokenResponse {
        token,
        expires_in: expiry_hours * 3600,
        user,
        tenant,
    })
}
