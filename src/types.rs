//! Shared types used across the codebase

use uuid::Uuid;

/// Caller identity forwarded to every tenant-scoped operation.
/// Built by the tenant validation middleware from the JWT claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl TenantContext {
    pub fn new(tenant_id: Uuid, user_id: Uuid, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            tenant_id,
            user_id,
            email: email.into(),
            role: role.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.user_id.is_nil()
    }

    /// Owners and admins manage roles, users and page permissions
    pub fn is_administrator(&self) -> bool {
        self.role == "owner" || self.role == "admin"
    }
}

/// File payload handed to the upload services
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }
}

/// Error returned when a stored string does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `FromStr` and `Display` for unit enums persisted as text
#[macro_export]
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::types::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
