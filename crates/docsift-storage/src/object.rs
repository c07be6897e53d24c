use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use docsift_core::models::{AccessUrl, StorageMetadata, StoredObject};
use docsift_core::retry::is_transient_message;
use docsift_core::{RetryPolicy, StorageBackend};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};

use crate::config::ObjectStoreConfig;
use crate::keys::generate_object_key;
use crate::redact::SecretRedactor;
use crate::traits::{StorageAdapter, StorageError, StorageResult};

/// Produces time-limited GET URLs for objects.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn signed_get_url(&self, location: &Path, expires_in: Duration) -> ObjectResult<String>;
}

#[async_trait]
impl UrlSigner for AmazonS3 {
    async fn signed_get_url(&self, location: &Path, expires_in: Duration) -> ObjectResult<String> {
        let url = self.signed_url(Method::GET, location, expires_in).await?;
        Ok(url.to_string())
    }
}

/// Signer for stores without presigning support (in-memory stores in tests).
/// URLs point at `{base_url}/{key}` with the expiry as a query parameter.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub struct StaticUrlSigner {
    base_url: String,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticUrlSigner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl UrlSigner for StaticUrlSigner {
    async fn signed_get_url(&self, location: &Path, expires_in: Duration) -> ObjectResult<String> {
        Ok(format!(
            "{}/{}?expires={}",
            self.base_url,
            location,
            expires_in.as_secs()
        ))
    }
}

fn is_transient(err: &ObjectStoreError) -> bool {
    !matches!(err, ObjectStoreError::NotFound { .. }) && is_transient_message(&err.to_string())
}

/// Run `put` under `retry`, retrying transient store errors.
async fn put_with_retry<T, F, Fut>(
    retry: &RetryPolicy,
    location: &Path,
    mut put: F,
) -> ObjectResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ObjectResult<T>>,
{
    retry
        .run(is_transient, |attempt| {
            tracing::debug!(attempt, key = %location, "Object store put");
            put()
        })
        .await
}

/// S3-compatible object storage with content-addressable keys and presigned
/// access URLs.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn object_store::ObjectStore>,
    signer: Arc<dyn UrlSigner>,
    bucket: String,
    url_expiry: Duration,
    retry: RetryPolicy,
    redactor: SecretRedactor,
}

impl ObjectStorage {
    pub fn new(
        store: Arc<dyn object_store::ObjectStore>,
        signer: Arc<dyn UrlSigner>,
        bucket: impl Into<String>,
        url_expiry: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            signer,
            bucket: bucket.into(),
            url_expiry,
            retry,
            redactor: SecretRedactor::default(),
        }
    }

    pub fn with_redactor(mut self, redactor: SecretRedactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Build an S3 client from validated configuration. Credentials not given
    /// explicitly are picked up from the environment.
    pub fn s3(
        config: &ObjectStoreConfig,
        retry: RetryPolicy,
        redactor: SecretRedactor,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(config.region.clone())
            .with_bucket_name(config.bucket.clone());

        if let Some(ref endpoint) = config.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }
        if let Some(ref key_id) = config.access_key_id {
            builder = builder.with_access_key_id(key_id.clone());
        }
        if let Some(ref secret) = config.secret_access_key {
            builder = builder.with_secret_access_key(secret.clone());
        }

        let s3 = Arc::new(
            builder
                .build()
                .map_err(|e| StorageError::ConfigError(redactor.redact(&e.to_string())))?,
        );

        Ok(Self {
            store: s3.clone(),
            signer: s3,
            bucket: config.bucket.clone(),
            url_expiry: config.url_expiry,
            retry,
            redactor,
        })
    }

    fn elapsed_ms(start: Instant) -> f64 {
        start.elapsed().as_secs_f64() * 1000.0
    }
}

#[async_trait]
impl StorageAdapter for ObjectStorage {
    async fn upload(&self, data: Bytes, metadata: &StorageMetadata) -> StorageResult<StoredObject> {
        let key = generate_object_key(metadata, Utc::now());
        let location = Path::from(key.clone());
        let size = data.len() as u64;
        let start = Instant::now();

        let result = put_with_retry(&self.retry, &location, || {
            let store = self.store.clone();
            let location = location.clone();
            let payload = PutPayload::from(data.clone());
            async move { store.put(&location, payload).await }
        })
        .await;

        result.map_err(|e| {
            let message = self.redactor.redact(&e.to_string());
            tracing::error!(
                error = %message,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = Self::elapsed_ms(start),
                "Object store upload failed"
            );
            StorageError::UploadFailed(message)
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = Self::elapsed_ms(start),
            "Object store upload successful"
        );

        Ok(StoredObject {
            storage_key: key,
            backend: StorageBackend::ObjectStore,
            access_hint: None,
        })
    }

    async fn access_url(&self, storage_key: &str) -> StorageResult<AccessUrl> {
        let location = Path::from(storage_key.to_string());

        match self.store.head(&location).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => {
                let message = self.redactor.redact(&e.to_string());
                tracing::error!(
                    error = %message,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "Object store head failed"
                );
                return Err(StorageError::DownloadFailed(message));
            }
        }

        let url = self
            .signer
            .signed_get_url(&location, self.url_expiry)
            .await
            .map_err(|e| StorageError::DownloadFailed(self.redactor.redact(&e.to_string())))?;

        Ok(AccessUrl {
            url,
            expires_in: Some(self.url_expiry),
        })
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                let message = self.redactor.redact(&e.to_string());
                tracing::error!(
                    error = %message,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = Self::elapsed_ms(start),
                    "Object store delete failed"
                );
                return Err(StorageError::DeleteFailed(message));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = Self::elapsed_ms(start),
            "Object store delete successful"
        );

        Ok(())
    }

    fn is_configured(&self) -> bool {
        !self.bucket.is_empty()
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::ObjectStore
    }
}
