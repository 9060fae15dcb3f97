// handlers/elevated/root/tenant/list.rs - GET /root/tenants

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult};

/// Every registered practice, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Tenant>> {
    Ok(ApiResponse::success(state.tenants.list_tenants().await?))
}
