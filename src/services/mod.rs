pub mod client_service;
pub mod clinical_service;
pub mod document_service;
pub mod error;
pub mod resource_service;
pub mod role_service;
pub mod settings_service;
pub mod tenant_service;
pub mod upload;
pub mod user_service;
pub mod video_service;

pub use client_service::ClientService;
pub use clinical_service::ClinicalService;
pub use document_service::DocumentService;
pub use error::{ServiceError, ServiceResult};
pub use resource_service::ResourceService;
pub use role_service::RoleService;
pub use settings_service::SettingsService;
pub use tenant_service::TenantService;
pub use user_service::UserService;
pub use video_service::VideoService;
