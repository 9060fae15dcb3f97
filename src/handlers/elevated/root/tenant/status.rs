// handlers/elevated/root/tenant/status.rs - PUT /root/tenants/:id/status

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Tenant, TenantStatus};
use crate::handlers::protected::utils::parse_uuid;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TenantStatus,
}

/// Suspends or reactivates a practice. Tenants are never hard-deleted.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(operator): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Tenant> {
    let id = parse_uuid(&id, "tenant")?;
    let tenant = state.tenants.set_status(id, payload.status).await?;
    tracing::info!("Operator {} set tenant {} to {}", operator.email, tenant.tenant_id, tenant.status);
    Ok(ApiResponse::success(tenant))
}
