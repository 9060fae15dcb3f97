use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    Extension,
};
use serde::Deserialize;

use super::utils::{file_response, parse_uuid, UploadForm};
use crate::app::AppState;
use crate::database::models::Document;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::document_service::CreateDocumentInput;
use crate::types::TenantContext;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub client_id: Option<String>,
}

/// GET /documents[?client_id=...]
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Document>> {
    let documents = state.documents.list_documents(&ctx, query.client_id.as_deref()).await?;
    Ok(ApiResponse::success(documents))
}

/// POST /documents - multipart with `file`, `title`, optional `description` and `client_id`
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    multipart: Multipart,
) -> ApiResult<Document> {
    let form = UploadForm::read(multipart).await?;
    let input = CreateDocumentInput {
        client_id: form.text("client_id").filter(|c| !c.trim().is_empty()),
        title: form.text("title").unwrap_or_default(),
        description: form.text("description"),
        file: form.file,
    };

    Ok(ApiResponse::created(state.documents.create_document(&ctx, input).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let id = parse_uuid(&id, "document")?;
    Ok(ApiResponse::success(state.documents.get_document(&ctx, id).await?))
}

pub async fn download(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_uuid(&id, "document")?;
    let (document, object) = state.documents.download_for(&ctx, id).await?;
    Ok(file_response(object, Some(&document.mime_type), &document.file_path))
}

/// DELETE /documents/:id - removes the row and the stored file
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_uuid(&id, "document")?;
    state.documents.delete_document(&ctx, id).await?;
    Ok(ApiResponse::no_content())
}
