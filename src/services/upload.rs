//! Helpers shared by the resource and document upload paths.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::services::error::{ServiceError, ServiceResult};
use crate::types::{FileUpload, TenantContext};

const SUFFIX_LEN: usize = 8;
const FALLBACK_EXTENSION: &str = "bin";
const FALLBACK_MIME: &str = "application/octet-stream";

/// `{timestamp_ms}-{random_suffix}.{extension}`, unique without a central sequence
pub fn timestamped_name(file_name: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(SUFFIX_LEN).collect();
    format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, file_extension(file_name))
}

/// Lowercased extension, restricted to ASCII alphanumerics
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Declared content type when present, otherwise guessed from the extension.
/// A declared `application/octet-stream` counts as undeclared.
pub fn mime_type(upload: &FileUpload) -> String {
    if let Some(declared) = upload
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case(FALLBACK_MIME))
    {
        return declared.to_string();
    }

    let guessed = match file_extension(&upload.file_name).as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => FALLBACK_MIME,
    };
    guessed.to_string()
}

pub fn require_authenticated(ctx: &TenantContext) -> ServiceResult<()> {
    if ctx.is_authenticated() {
        Ok(())
    } else {
        Err(ServiceError::Auth("Not authenticated".to_string()))
    }
}

pub fn parse_client_id(client_id: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(client_id.trim()).map_err(|_| ServiceError::validation("Invalid client ID"))
}

pub fn check_upload(upload: &FileUpload, max_bytes: usize) -> ServiceResult<()> {
    if upload.bytes.is_empty() {
        return Err(ServiceError::validation("File is empty"));
    }
    if upload.bytes.len() > max_bytes {
        return Err(ServiceError::validation(format!(
            "File exceeds the {} byte upload limit",
            max_bytes
        )));
    }
    Ok(())
}

pub fn required_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::validation("Title is required"));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_carry_timestamp_suffix_and_extension() {
        let name = timestamped_name("Intake Form.PDF");
        let (stamp, rest) = name.split_once('-').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert!(rest.ends_with(".pdf"));
        assert_eq!(rest.len(), SUFFIX_LEN + ".pdf".len());
        assert_ne!(timestamped_name("a.pdf"), timestamped_name("a.pdf"));
    }

    #[test]
    fn odd_extensions_fall_back_to_bin() {
        assert_eq!(file_extension("notes"), "bin");
        assert_eq!(file_extension("weird.p/f"), "bin");
        assert_eq!(file_extension("scan.JPeG"), "jpeg");
    }

    #[test]
    fn mime_prefers_declared_type() {
        let declared = FileUpload::new("x.bin", Some("application/pdf".into()), vec![1]);
        assert_eq!(mime_type(&declared), "application/pdf");

        let guessed = FileUpload::new("x.png", None, vec![1]);
        assert_eq!(mime_type(&guessed), "image/png");
    }

    #[test]
    fn octet_stream_falls_back_to_the_extension() {
        let generic = FileUpload::new("plan.pdf", Some("application/octet-stream".into()), vec![1]);
        assert_eq!(mime_type(&generic), "application/pdf");

        let unknown = FileUpload::new("blob.xyz", Some("application/octet-stream".into()), vec![1]);
        assert_eq!(mime_type(&unknown), "application/octet-stream");
    }

    #[test]
    fn client_ids_must_be_uuids() {
        assert!(parse_client_id("not-a-uuid").is_err());
        assert!(parse_client_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
