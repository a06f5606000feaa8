//! Thin wrapper around the object storage backends (S3/GCS/local/memory).
//!
//! Everything here is a direct pass-through to the `object_store` crate; the
//! only behavior added on top is NotFound tolerance on reads and deletes, and
//! the conditional-create primitive the container lifecycle and the
//! distributed lock are built on.

use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ListResult, ObjectMeta, ObjectStore, PutMode, PutOptions};

use crate::config::BackendConfig;
use crate::error::{Result, StoreError};

/// Shared handle to an object storage backend.
///
/// Cheap to clone; safe for concurrent use by any number of in-process
/// callers. All serialization is delegated to the backing store's atomic
/// object operations.
#[derive(Debug, Clone)]
pub struct Backend {
    inner: Arc<dyn ObjectStore>,
}

impl Backend {
    /// Create a new backend from configuration.
    pub async fn new(config: BackendConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match &config {
            BackendConfig::Memory => Arc::new(InMemory::new()),

            BackendConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                )
            }

            BackendConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    // PutMode::Create needs conditional writes on S3
                    .with_conditional_put(S3ConditionalPut::ETagMatch)
                    .with_allow_http(endpoint.starts_with("http://"));

                Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                )
            }

            BackendConfig::Gcs {
                bucket,
                service_account,
            } => {
                let mut builder =
                    GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
                if let Some(path) = service_account {
                    builder = builder.with_service_account_path(path.to_string_lossy());
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                )
            }
        };

        Ok(Self { inner })
    }

    /// Put object bytes, fully overwriting any prior content.
    ///
    /// The write is single-shot: readers observe either the old content or
    /// the new content, never a partial write.
    pub async fn put(&self, path: &ObjectPath, data: Bytes) -> Result<()> {
        self.inner.put(path, data.into()).await?;
        Ok(())
    }

    /// Conditionally create an object, failing if it already exists.
    ///
    /// Returns `true` if this call created the object, `false` if another
    /// writer got there first. The backing store's atomicity guarantees at
    /// most one concurrent creator succeeds.
    pub async fn put_if_absent(&self, path: &ObjectPath, data: Bytes) -> Result<bool> {
        let opts = PutOptions {
            mode: PutMode::Create,
            ..Default::default()
        };
        match self.inner.put_opts(path, data.into(), opts).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::AlreadyExists { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Get object bytes, or `None` if the object does not exist.
    pub async fn get(&self, path: &ObjectPath) -> Result<Option<Bytes>> {
        match self.inner.get(path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get object metadata, or `None` if the object does not exist.
    pub async fn head(&self, path: &ObjectPath) -> Result<Option<ObjectMeta>> {
        match self.inner.head(path).await {
            Ok(meta) => Ok(Some(meta)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it was already
    /// absent (including when a concurrent deleter raced us to it). Absence
    /// is checked explicitly: backends disagree on whether deleting a
    /// missing object reports NotFound or silently succeeds.
    pub async fn delete(&self, path: &ObjectPath) -> Result<bool> {
        if self.head(path).await?.is_none() {
            return Ok(false);
        }
        match self.inner.delete(path).await {
            Ok(()) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List all objects under a prefix.
    ///
    /// The underlying stream handles pagination, so multi-page listings come
    /// back as one finite sequence.
    pub async fn list(&self, prefix: &ObjectPath) -> Result<Vec<ObjectMeta>> {
        use futures::TryStreamExt;

        let stream = self.inner.list(Some(prefix));
        let items: Vec<_> = stream.try_collect().await?;
        Ok(items)
    }

    /// List immediate children under a prefix, treating `/` as a directory
    /// delimiter. Deeper entries come back as common prefixes.
    pub async fn list_with_delimiter(&self, prefix: &ObjectPath) -> Result<ListResult> {
        Ok(self.inner.list_with_delimiter(Some(prefix)).await?)
    }
}

#[cfg(test)]
impl Backend {
    /// Create an in-memory backend (test-only).
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }
}
