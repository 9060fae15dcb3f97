use axum::Extension;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub root: bool,
    pub tenant: Tenant,
}

/// GET /auth/whoami - identity from the token plus the caller's practice
pub async fn whoami(Extension(user): Extension<AuthUser>, Extension(tenant): Extension<Tenant>) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI {
        user_id: user.user_id,
        email: user.email,
        role: user.role,
        root: user.root,
        tenant,
    }))
}
