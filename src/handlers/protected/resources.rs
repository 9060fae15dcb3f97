use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    Extension,
};

use super::utils::{file_response, parse_uuid, UploadForm};
use crate::app::AppState;
use crate::database::models::{Resource, ResourceType};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::resource_service::CreateResourceInput;
use crate::types::TenantContext;

/// GET /clients/:id/resources - active resources, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
) -> ApiResult<Vec<Resource>> {
    Ok(ApiResponse::success(state.resources.get_client_resources(&ctx, &client_id).await?))
}

/// POST /clients/:id/resources - multipart with `resource_type`, `title`,
/// optional `description`, and either `file` or `url`
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(client_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Resource> {
    let form = UploadForm::read(multipart).await?;

    let resource_type = match form.text("resource_type") {
        Some(raw) => raw
            .trim()
            .parse::<ResourceType>()
            .map_err(|_| ApiError::bad_request(format!("Unknown resource type '{}'", raw)))?,
        None if form.file.is_some() => ResourceType::Document,
        None => ResourceType::Url,
    };

    let input = CreateResourceInput {
        client_id,
        resource_type,
        title: form.text("title").unwrap_or_default(),
        description: form.text("description"),
        url: form.text("url"),
        file: form.file,
    };

    Ok(ApiResponse::created(state.resources.create_resource(&ctx, input).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<Resource> {
    let id = parse_uuid(&id, "resource")?;
    Ok(ApiResponse::success(state.resources.get_resource(&ctx, id).await?))
}

/// GET /resources/:id/download - authorized through the caller's tenant row
pub async fn download(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_uuid(&id, "resource")?;
    let (resource, object) = state.resources.download_for(&ctx, id).await?;
    let path = resource.file_path.as_deref().unwrap_or_default();
    Ok(file_response(object, resource.mime_type.as_deref(), path))
}

/// DELETE /resources/:id - soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<Resource> {
    let id = parse_uuid(&id, "resource")?;
    Ok(ApiResponse::success(state.resources.delete_resource(&ctx, id).await?))
}
