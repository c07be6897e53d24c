//! Configuration module
//!
//! This module provides the configuration structures for the document service:
//! server, storage backend, key/value store and analysis settings.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const INLINE_MAX_BYTES: usize = 1024 * 1024;
const ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const ANALYSIS_TIMEOUT_SECS: u64 = 30;
const ANALYSIS_MAX_RETRIES: u32 = 2;
const ANALYSIS_RETRY_BASE_MS: u64 = 1000;
const ANALYSIS_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const ANALYSIS_DAILY_LIMIT: u32 = 50;
const MAX_UPLOAD_SIZE_MB: usize = 10;
const ACCESS_URL_EXPIRY_SECS: u64 = 3600;
const DOCUMENT_LIST_MAX: usize = 100;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub public_base_url: String,
    pub max_upload_size_bytes: usize,
}

/// Document service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub access_url_expiry_secs: u64,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub inline_max_bytes: usize,
    // Key/value store (cache, quotas, document lists). None = in-memory
    pub redis_url: Option<String>,
    pub document_list_max: usize,
    // Analysis configuration
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub analysis_timeout_secs: u64,
    pub analysis_max_retries: u32,
    pub analysis_retry_base_ms: u64,
    pub analysis_cache_ttl_secs: u64,
    pub analysis_daily_limit: u32,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn as_service(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_service().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    // Convenience getters
    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_service().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn public_base_url(&self) -> &str {
        &self.as_service().base.public_base_url
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_service().base.max_upload_size_bytes
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_service().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_service().s3_bucket.as_deref()
    }

    /// `S3_REGION`, falling back to `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.as_service()
            .s3_region
            .as_deref()
            .or(self.as_service().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_service().s3_endpoint.as_deref()
    }

    pub fn aws_access_key_id(&self) -> Option<&str> {
        self.as_service().aws_access_key_id.as_deref()
    }

    pub fn aws_secret_access_key(&self) -> Option<&str> {
        self.as_service().aws_secret_access_key.as_deref()
    }

    pub fn access_url_expiry(&self) -> Duration {
        Duration::from_secs(self.as_service().access_url_expiry_secs)
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_service().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_service().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_service().db_timeout_seconds
    }

    pub fn inline_max_bytes(&self) -> usize {
        self.as_service().inline_max_bytes
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.as_service().redis_url.as_deref()
    }

    pub fn document_list_max(&self) -> usize {
        self.as_service().document_list_max
    }

    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.as_service().anthropic_api_key.as_deref()
    }

    pub fn anthropic_model(&self) -> &str {
        &self.as_service().anthropic_model
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.as_service().analysis_timeout_secs)
    }

    pub fn analysis_max_retries(&self) -> u32 {
        self.as_service().analysis_max_retries
    }

    pub fn analysis_retry_base(&self) -> Duration {
        Duration::from_millis(self.as_service().analysis_retry_base_ms)
    }

    pub fn analysis_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.as_service().analysis_cache_ttl_secs)
    }

    pub fn analysis_daily_limit(&self) -> u32 {
        self.as_service().analysis_daily_limit
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let storage_backend = match non_empty(lookup("STORAGE_BACKEND")) {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::ObjectStore,
        };

        let public_base_url = non_empty(lookup("PUBLIC_BASE_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        let max_upload_size_mb = parse_or(lookup("MAX_UPLOAD_SIZE_MB"), MAX_UPLOAD_SIZE_MB);

        let base = BaseConfig {
            server_port,
            cors_origins,
            environment,
            public_base_url,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
        };

        let config = ServiceConfig {
            base,
            storage_backend,
            s3_bucket: non_empty(lookup("S3_BUCKET")),
            s3_region: non_empty(lookup("S3_REGION")),
            s3_endpoint: non_empty(lookup("S3_ENDPOINT")),
            aws_region: non_empty(lookup("AWS_REGION")),
            aws_access_key_id: non_empty(lookup("AWS_ACCESS_KEY_ID")),
            aws_secret_access_key: non_empty(lookup("AWS_SECRET_ACCESS_KEY")),
            access_url_expiry_secs: parse_or(
                lookup("ACCESS_URL_EXPIRY_SECS"),
                ACCESS_URL_EXPIRY_SECS,
            ),
            database_url: non_empty(lookup("DATABASE_URL")),
            db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(lookup("DB_TIMEOUT_SECONDS"), CONNECTION_TIMEOUT_SECS),
            inline_max_bytes: parse_or(lookup("INLINE_MAX_BYTES"), INLINE_MAX_BYTES),
            redis_url: non_empty(lookup("REDIS_URL")),
            document_list_max: parse_or(lookup("DOCUMENT_LIST_MAX"), DOCUMENT_LIST_MAX),
            anthropic_api_key: non_empty(lookup("ANTHROPIC_API_KEY")),
            anthropic_model: non_empty(lookup("ANTHROPIC_MODEL"))
                .unwrap_or_else(|| ANTHROPIC_MODEL.to_string()),
            analysis_timeout_secs: parse_or(lookup("ANALYSIS_TIMEOUT_SECS"), ANALYSIS_TIMEOUT_SECS),
            analysis_max_retries: parse_or(lookup("ANALYSIS_MAX_RETRIES"), ANALYSIS_MAX_RETRIES),
            analysis_retry_base_ms: parse_or(
                lookup("ANALYSIS_RETRY_BASE_MS"),
                ANALYSIS_RETRY_BASE_MS,
            ),
            analysis_cache_ttl_secs: parse_or(
                lookup("ANALYSIS_CACHE_TTL_SECS"),
                ANALYSIS_CACHE_TTL_SECS,
            ),
            analysis_daily_limit: parse_or(lookup("ANALYSIS_DAILY_LIMIT"), ANALYSIS_DAILY_LIMIT),
        };

        config.validate()?;
        Ok(config)
    }

    /// General sanity checks. Backend-specific required fields are checked by
    /// the storage registry when it resolves the backend.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.analysis_timeout_secs == 0 {
            return Err(anyhow::anyhow!("ANALYSIS_TIMEOUT_SECS must be greater than 0"));
        }

        if self.document_list_max == 0 {
            return Err(anyhow::anyhow!("DOCUMENT_LIST_MAX must be greater than 0"));
        }

        if self.access_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!("ACCESS_URL_EXPIRY_SECS must be greater than 0"));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        Ok(())
    }
}
