use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// This enum defines the available storage backend types.
/// It's defined in core because it's used in configuration and in document metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    /// S3-compatible object store (content-addressable keys, presigned access)
    ObjectStore,
    /// Relational database, content kept in a binary column
    Relational,
    /// Content embedded in the document metadata itself
    Inline,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "object-store" | "object_store" | "objectstore" | "s3" => Ok(StorageBackend::ObjectStore),
            "relational" | "postgres" | "postgresql" | "database" => Ok(StorageBackend::Relational),
            "inline" => Ok(StorageBackend::Inline),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::ObjectStore => write!(f, "object-store"),
            StorageBackend::Relational => write!(f, "relational"),
            StorageBackend::Inline => write!(f, "inline"),
        }
    }
}

/// Typed failure codes carried by every storage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageErrorKind {
    UploadFailed,
    DownloadFailed,
    DeleteFailed,
    NotFound,
    ConfigurationError,
    SizeLimitExceeded,
}

impl StorageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageErrorKind::UploadFailed => "upload-failed",
            StorageErrorKind::DownloadFailed => "download-failed",
            StorageErrorKind::DeleteFailed => "delete-failed",
            StorageErrorKind::NotFound => "not-found",
            StorageErrorKind::ConfigurationError => "configuration-error",
            StorageErrorKind::SizeLimitExceeded => "size-limit-exceeded",
        }
    }
}

impl Display for StorageErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
