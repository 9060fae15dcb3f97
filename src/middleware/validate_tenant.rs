use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::error::ApiError;
use crate::services::ServiceError;
use crate::types::TenantContext;

/// Middleware that checks the tenant named in the JWT exists and is active,
/// then injects the [`TenantContext`] every protected handler works from.
pub async fn validate_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before tenant validation").into_response())?;

    let tenant = match state.tenants.get_tenant(auth_user.tenant_id).await {
        Ok(tenant) => tenant,
        Err(ServiceError::NotFound(_)) => {
            tracing::warn!("Token for {} names unknown tenant {}", auth_user.user_id, auth_user.tenant_id);
            return Err(ApiError::forbidden("Practice is not active or does not exist").into_response());
        }
        Err(e) => return Err(ApiError::from(e).into_response()),
    };

    if !tenant.is_active() {
        tracing::warn!("Rejected request for suspended tenant {}", tenant.tenant_id);
        return Err(ApiError::forbidden("Practice is suspended").into_response());
    }

    tracing::debug!("Tenant validation successful: {} ({})", tenant.practice_name, tenant.tenant_id);

    let ctx = TenantContext::new(tenant.tenant_id, auth_user.user_id, auth_user.email, auth_user.role);
    request.extensions_mut().insert(ctx);
    request.extensions_mut().insert(tenant);

    Ok(next.run(request).await)
}
