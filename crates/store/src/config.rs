//! Backend configuration (S3/GCS/local filesystem/memory).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },

    /// Google Cloud Storage
    Gcs {
        /// Bucket name
        bucket: String,
        /// Path to a service account JSON key. Falls back to ambient
        /// credentials (GOOGLE_SERVICE_ACCOUNT etc.) when absent.
        service_account: Option<PathBuf>,
    },
}
