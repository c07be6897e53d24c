//! Backend-specific storage configuration.
//!
//! One variant per backend, each carrying only the fields that backend needs.
//! Building a [`StorageConfig`] validates that the required fields are present.

use std::time::Duration;

use docsift_core::{Config, StorageBackend};
use serde_json::{json, Value};

use crate::redact::{mask_secret, mask_userinfo, SecretRedactor};
use crate::traits::{StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub url_expiry: Duration,
}

#[derive(Debug, Clone)]
pub struct RelationalConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Base URL used to build streaming endpoint URLs.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct InlineConfig {
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    ObjectStore(ObjectStoreConfig),
    Relational(RelationalConfig),
    Inline(InlineConfig),
}

fn required(value: Option<&str>, name: &str, backend: StorageBackend) -> StorageResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            StorageError::ConfigError(format!(
                "{} must be set when using the {} storage backend",
                name, backend
            ))
        })
}

impl StorageConfig {
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        let backend = config.storage_backend();

        match backend {
            StorageBackend::ObjectStore => {
                let bucket = required(config.s3_bucket(), "S3_BUCKET", backend)?;
                let region = required(config.s3_region(), "S3_REGION or AWS_REGION", backend)?;

                let access_key_id = config.aws_access_key_id().map(String::from);
                let secret_access_key = config.aws_secret_access_key().map(String::from);
                if access_key_id.is_some() != secret_access_key.is_some() {
                    return Err(StorageError::ConfigError(
                        "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
                            .to_string(),
                    ));
                }

                Ok(StorageConfig::ObjectStore(ObjectStoreConfig {
                    bucket,
                    region,
                    endpoint: config.s3_endpoint().map(String::from),
                    access_key_id,
                    secret_access_key,
                    url_expiry: config.access_url_expiry(),
                }))
            }
            StorageBackend::Relational => {
                let database_url = required(config.database_url(), "DATABASE_URL", backend)?;
                Ok(StorageConfig::Relational(RelationalConfig {
                    database_url,
                    max_connections: config.db_max_connections(),
                    acquire_timeout: Duration::from_secs(config.db_timeout_seconds()),
                    public_base_url: config.public_base_url().to_string(),
                }))
            }
            StorageBackend::Inline => {
                let max_bytes = config.inline_max_bytes();
                if max_bytes == 0 {
                    return Err(StorageError::ConfigError(
                        "INLINE_MAX_BYTES must be greater than 0".to_string(),
                    ));
                }
                Ok(StorageConfig::Inline(InlineConfig { max_bytes }))
            }
        }
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            StorageConfig::ObjectStore(_) => StorageBackend::ObjectStore,
            StorageConfig::Relational(_) => StorageBackend::Relational,
            StorageConfig::Inline(_) => StorageBackend::Inline,
        }
    }

    /// Redactor loaded with every secret this configuration holds.
    pub fn redactor(&self) -> SecretRedactor {
        let mut secrets = Vec::new();
        match self {
            StorageConfig::ObjectStore(c) => {
                secrets.extend(c.access_key_id.clone());
                secrets.extend(c.secret_access_key.clone());
            }
            StorageConfig::Relational(c) => secrets.push(c.database_url.clone()),
            StorageConfig::Inline(_) => {}
        }
        SecretRedactor::new(secrets)
    }

    /// Configuration with secrets masked, safe to log or return from diagnostics.
    pub fn masked(&self) -> Value {
        match self {
            StorageConfig::ObjectStore(c) => json!({
                "backend": self.backend().to_string(),
                "bucket": c.bucket,
                "region": c.region,
                "endpoint": c.endpoint.as_deref().map(mask_userinfo),
                "accessKeyId": c.access_key_id.as_deref().map(mask_secret),
                "secretAccessKey": c.secret_access_key.as_deref().map(mask_secret),
                "urlExpirySecs": c.url_expiry.as_secs(),
            }),
            StorageConfig::Relational(c) => json!({
                "backend": self.backend().to_string(),
                "databaseUrl": mask_userinfo(&c.database_url),
                "maxConnections": c.max_connections,
                "acquireTimeoutSecs": c.acquire_timeout.as_secs(),
                "publicBaseUrl": c.public_base_url,
            }),
            StorageConfig::Inline(c) => json!({
                "backend": self.backend().to_string(),
                "maxBytes": c.max_bytes,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::ServiceConfig;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config(Box::new(
            ServiceConfig::from_lookup(|key| map.get(key).cloned()).unwrap(),
        ))
    }

    #[test]
    fn test_object_store_requires_bucket_and_region() {
        let err = StorageConfig::from_config(&config(&[])).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let err = StorageConfig::from_config(&config(&[("S3_BUCKET", "docs")])).unwrap_err();
        assert!(err.to_string().contains("S3_REGION"));

        let ok = StorageConfig::from_config(&config(&[
            ("S3_BUCKET", "docs"),
            ("AWS_REGION", "us-east-1"),
        ]))
        .unwrap();
        assert_eq!(ok.backend(), StorageBackend::ObjectStore);
    }

    #[test]
    fn test_relational_requires_database_url() {
        let err = StorageConfig::from_config(&config(&[("STORAGE_BACKEND", "relational")]))
            .unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_inline_needs_nothing_else() {
        let cfg = StorageConfig::from_config(&config(&[("STORAGE_BACKEND", "inline")])).unwrap();
        assert_eq!(cfg.backend(), StorageBackend::Inline);
    }

    #[test]
    fn test_masked_config_hides_secrets() {
        let cfg = StorageConfig::from_config(&config(&[
            ("S3_BUCKET", "docs"),
            ("S3_REGION", "eu-west-1"),
            ("AWS_ACCESS_KEY_ID", "AKIAABCDEFGHIJKL"),
            ("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMIK7MDENGbPxRfiCY"),
        ]))
        .unwrap();
        let masked = cfg.masked().to_string();
        assert!(!masked.contains("AKIAABCDEFGHIJKL"));
        assert!(!masked.contains("wJalrXUtnFEMIK7MDENGbPxRfiCY"));
        assert!(masked.contains("AKIA****IJKL"));

        let relational = StorageConfig::from_config(&config(&[
            ("STORAGE_BACKEND", "relational"),
            ("DATABASE_URL", "postgres://app:hunter2@db/docs"),
        ]))
        .unwrap();
        assert!(!relational.masked().to_string().contains("hunter2"));
    }
}
