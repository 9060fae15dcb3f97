use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub permissions: PermissionConfig,
    pub video: VideoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Empty means "use the in-memory store"
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root: String,
    pub resources_bucket: String,
    pub documents_bucket: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Users whose login email is listed here receive the `root` claim
    pub root_emails: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagePolicy {
    Allow,
    Deny,
}

impl PagePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(PagePolicy::Allow),
            "deny" => Some(PagePolicy::Deny),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Applied when a page has no permission row
    pub default_page_policy: PagePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub account_sid: String,
    pub api_key_sid: String,
    pub api_key_secret: String,
    pub api_base_url: String,
    pub token_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_ROOT") {
            self.storage.root = v;
        }
        if let Ok(v) = env::var("STORAGE_MAX_UPLOAD_BYTES") {
            self.storage.max_upload_bytes = v.parse().unwrap_or(self.storage.max_upload_bytes);
        }

        // API overrides
        if let Some(port) = env::var("PRACTICE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ROOT_EMAILS") {
            self.security.root_emails = split_list(&v);
        }

        // Permission overrides
        if let Ok(v) = env::var("PERMISSIONS_DEFAULT_PAGE_POLICY") {
            if let Some(policy) = PagePolicy::parse(&v) {
                self.permissions.default_page_policy = policy;
            }
        }

        // Video provider overrides
        if let Ok(v) = env::var("VIDEO_ACCOUNT_SID") {
            self.video.account_sid = v;
        }
        if let Ok(v) = env::var("VIDEO_API_KEY_SID") {
            self.video.api_key_sid = v;
        }
        if let Ok(v) = env::var("VIDEO_API_KEY_SECRET") {
            self.video.api_key_secret = v;
        }
        if let Ok(v) = env::var("VIDEO_API_BASE_URL") {
            self.video.api_base_url = v;
        }
        if let Ok(v) = env::var("VIDEO_TOKEN_TTL_SECS") {
            self.video.token_ttl_secs = v.parse().unwrap_or(self.video.token_ttl_secs);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            storage: StorageConfig {
                root: "./storage".to_string(),
                resources_bucket: "client-resources".to_string(),
                documents_bucket: "documents".to_string(),
                max_upload_bytes: 25 * 1024 * 1024, // 25MB
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                root_emails: Vec::new(),
            },
            permissions: PermissionConfig {
                default_page_policy: PagePolicy::Deny,
            },
            video: VideoConfig::twilio_defaults(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            storage: StorageConfig {
                root: "/var/lib/practice-api/storage".to_string(),
                resources_bucket: "client-resources".to_string(),
                documents_bucket: "documents".to_string(),
                max_upload_bytes: 25 * 1024 * 1024,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                root_emails: Vec::new(),
            },
            permissions: PermissionConfig {
                default_page_policy: PagePolicy::Deny,
            },
            video: VideoConfig::twilio_defaults(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            storage: StorageConfig {
                root: "/var/lib/practice-api/storage".to_string(),
                resources_bucket: "client-resources".to_string(),
                documents_bucket: "documents".to_string(),
                max_upload_bytes: 10 * 1024 * 1024,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                root_emails: Vec::new(),
            },
            permissions: PermissionConfig {
                default_page_policy: PagePolicy::Deny,
            },
            video: VideoConfig::twilio_defaults(),
        }
    }
}

impl VideoConfig {
    fn twilio_defaults() -> Self {
        Self {
            account_sid: String::new(),
            api_key_sid: String::new(),
            api_key_secret: String::new(),
            api_base_url: "https://video.twilio.com".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.database.url.is_empty());
        assert_eq!(config.permissions.default_page_policy, PagePolicy::Deny);
        assert_eq!(config.video.token_ttl_secs, 3600);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.run_migrations);
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }

    #[test]
    fn parses_page_policy() {
        assert_eq!(PagePolicy::parse(" Allow "), Some(PagePolicy::Allow));
        assert_eq!(PagePolicy::parse("deny"), Some(PagePolicy::Deny));
        assert_eq!(PagePolicy::parse("maybe"), None);
    }

    #[test]
    fn splits_comma_lists() {
        assert_eq!(split_list("a@x.com, b@y.com,,"), vec!["a@x.com", "b@y.com"]);
    }
}
