use thiserror::Error;
use tracing::error;

use crate::database::DatabaseError;
use crate::storage::StorageError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the service layer. Messages are safe to show to callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Third-party provider (video) rejected or failed the call
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::Conflict(msg) => ServiceError::Conflict(msg),
            other => {
                error!("Store operation failed: {}", other);
                ServiceError::Unknown(other.to_string())
            }
        }
    }
}
