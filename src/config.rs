/// Configuration management for the corporate site backend
use crate::error::{SiteError, SiteResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub uploads: UploadLimits,
    pub authentication: AuthConfig,
    pub cache: PageCacheConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL used when building public image URLs
    pub public_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub image_directory: PathBuf,
}

/// Limits applied to attached images, both in the editor and on upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadLimits {
    pub max_image_size: usize,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_image_size: 5 * 1024 * 1024, // 5MB
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

impl UploadLimits {
    /// Check a file against the size and content type limits
    pub fn check(&self, size: usize, content_type: &str) -> SiteResult<()> {
        if size == 0 {
            return Err(SiteError::Validation("Image file is empty".to_string()));
        }

        if size > self.max_image_size {
            return Err(SiteError::Validation(format!(
                "Image is {} bytes, limit is {} bytes",
                size, self.max_image_size
            )));
        }

        if !self
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
        {
            return Err(SiteError::Validation(format!(
                "Content type not allowed: {}",
                content_type
            )));
        }

        Ok(())
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Role claims allowed to use the admin API (comma-separated in env)
    pub admin_roles: Vec<String>,
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCacheConfig {
    /// Seconds a rendered page stays fresh without an explicit invalidation
    pub ttl: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directives; `RUST_LOG` takes precedence when set
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> SiteResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("SITE_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("SITE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| SiteError::Validation("Invalid port number".to_string()))?;
        let public_url = env::var("SITE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));

        let data_directory: PathBuf = env::var("SITE_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("SITE_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("site.sqlite"));
        let image_directory = env::var("SITE_IMAGE_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("images"));

        let defaults = UploadLimits::default();
        let max_image_size = env::var("SITE_MAX_IMAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_image_size);
        let allowed_content_types = env::var("SITE_ALLOWED_IMAGE_TYPES")
            .map(|v| split_list(&v))
            .unwrap_or(defaults.allowed_content_types);

        let jwt_secret = env::var("SITE_JWT_SECRET")
            .map_err(|_| SiteError::Validation("JWT secret required".to_string()))?;
        let admin_roles = split_list(
            &env::var("SITE_ADMIN_ROLES").unwrap_or_else(|_| "admin,super_admin".to_string()),
        );

        let cache_ttl = env::var("SITE_PAGE_CACHE_TTL")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let log_level = env::var("SITE_LOG_LEVEL")
            .unwrap_or_else(|_| "corp_site=debug,tower_http=debug".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url: public_url.trim_end_matches('/').to_string(),
            },
            storage: StorageConfig {
                data_directory,
                database,
                image_directory,
            },
            uploads: UploadLimits {
                max_image_size,
                allowed_content_types,
            },
            authentication: AuthConfig {
                jwt_secret,
                admin_roles,
            },
            cache: PageCacheConfig { ttl: cache_ttl },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> SiteResult<()> {
        if self.service.hostname.is_empty() {
            return Err(SiteError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(SiteError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.admin_roles.is_empty() {
            return Err(SiteError::Validation(
                "At least one admin role must be configured".to_string(),
            ));
        }

        if self.uploads.max_image_size == 0 {
            return Err(SiteError::Validation(
                "Image size limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
