use std::collections::HashMap;

use axum::{
    extract::Multipart,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::StoredObject;
use crate::types::FileUpload;

pub fn parse_uuid(value: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}

/// Text fields and the `file` part of a multipart upload
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<FileUpload>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                form.file = Some(FileUpload::new(file_name, content_type, bytes.to_vec()));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read field '{}': {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }
}

/// Streams stored bytes back with the recorded content type
pub fn file_response(object: StoredObject, fallback_type: Option<&str>, file_path: &str) -> Response {
    let content_type = object
        .content_type
        .as_deref()
        .or(fallback_type)
        .unwrap_or("application/octet-stream");
    let file_name = file_path.rsplit('/').next().unwrap_or(file_path);

    let mut response = (StatusCode::OK, object.bytes).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
