//! Bucket - the key-value facade the certificate manager stores blobs through.
//!
//! A bucket is a flat namespace of blobs scoped under a container name;
//! hierarchy is simulated via `/`-delimited key prefixes. Container existence
//! is encoded by a marker object, created lazily by [`Bucket::ensure_container`]
//! and removed by [`Bucket::delete_container`]. Constructing a handle with
//! [`Bucket::open`] never touches remote state, so tests and tooling can build
//! handles freely.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{Result, StoreError};

/// Marker object encoding "this container exists".
const CONTAINER_MARKER: &str = ".container";

/// Metadata for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    /// The key the blob is stored under
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// A named container of blobs in the backing object store.
///
/// Cheap to clone; all clones share the backend client. The facade holds no
/// mutable state of its own, so any number of tasks may use it concurrently.
#[derive(Debug, Clone)]
pub struct Bucket {
    backend: Backend,
    name: String,
    /// Identifies this handle in lock records, for diagnostics only.
    pub(crate) holder: String,
}

impl Bucket {
    /// Open a handle to a container.
    ///
    /// This performs no remote operations; call [`Bucket::ensure_container`]
    /// before first use if the container may not exist yet.
    pub fn open(backend: Backend, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::InvalidConfig(format!(
                "invalid container name: {name:?}"
            )));
        }
        Ok(Self {
            backend,
            name,
            holder: Uuid::new_v4().to_string(),
        })
    }

    /// The container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Map a logical key to its object path within the container.
    pub(crate) fn object_path(&self, key: &str) -> Result<ObjectPath> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey { key: key.into() });
        }
        Ok(ObjectPath::from(format!("{}/{}", self.name, key)))
    }

    fn marker_path(&self) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", self.name, CONTAINER_MARKER))
    }

    /// Strip the container prefix from a raw object path.
    fn logical_key(&self, location: &ObjectPath) -> Option<String> {
        location
            .as_ref()
            .strip_prefix(&format!("{}/", self.name))
            .map(|s| s.to_string())
    }

    /// Create the container if it does not exist yet.
    ///
    /// Idempotent: concurrent callers racing to create both succeed, one of
    /// them by observing the other's marker.
    pub async fn ensure_container(&self) -> Result<()> {
        let created = self
            .backend
            .put_if_absent(&self.marker_path(), Bytes::new())
            .await?;
        if created {
            info!(container = %self.name, "container created");
        } else {
            debug!(container = %self.name, "container already exists");
        }
        Ok(())
    }

    /// Whether the container exists.
    pub async fn container_exists(&self) -> Result<bool> {
        Ok(self.backend.head(&self.marker_path()).await?.is_some())
    }

    /// Delete every blob in the container, then the container itself.
    ///
    /// Tolerates blobs concurrently deleted by others; any transient backend
    /// failure propagates so the caller can retry the drain.
    pub async fn delete_container(&self) -> Result<()> {
        let prefix = ObjectPath::from(self.name.clone());
        for meta in self.backend.list(&prefix).await? {
            self.backend.delete(&meta.location).await?;
        }
        self.backend.delete(&self.marker_path()).await?;
        info!(container = %self.name, "container deleted");
        Ok(())
    }

    /// Write bytes to a key, fully overwriting any prior content.
    pub async fn store(&self, key: &str, value: Bytes) -> Result<()> {
        let path = self.object_path(key)?;
        debug!(container = %self.name, key = %key, size = value.len(), "storing blob");
        self.backend.put(&path, value).await
    }

    /// Read the full byte sequence for a key.
    pub async fn load(&self, key: &str) -> Result<Bytes> {
        let path = self.object_path(key)?;
        self.backend
            .get(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound { key: key.into() })
    }

    /// Remove a key.
    ///
    /// Deleting a missing key is an error: the caller asked to remove
    /// something that was never there, and silently succeeding would hide
    /// that. See DESIGN.md for the policy decision.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        if !self.backend.delete(&path).await? {
            return Err(StoreError::NotFound { key: key.into() });
        }
        debug!(container = %self.name, key = %key, "blob deleted");
        Ok(())
    }

    /// Whether a key exists.
    ///
    /// Never fails for the "not found" case; transport and auth failures
    /// still propagate so callers can tell absence from outage.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        Ok(self.backend.head(&path).await?.is_some())
    }

    /// List keys starting with a prefix.
    ///
    /// The prefix matches on the raw key string, so a partial final segment
    /// (`"acme/example"`) matches every key it is a string-prefix of. The
    /// backend only matches prefixes on whole path segments, so listing
    /// starts at the deepest full segment and re-filters here.
    ///
    /// With `recursive = true`, returns every matching key across all
    /// listing pages. With `recursive = false`, `/` acts as a directory
    /// delimiter: matching keys with no further `/` come back as-is and
    /// deeper entries collapse to `/`-terminated prefix markers. The
    /// container marker is an implementation detail and never listed.
    pub async fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let segments = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let full_prefix = if segments.is_empty() {
            ObjectPath::from(self.name.clone())
        } else {
            ObjectPath::from(format!("{}/{}", self.name, segments))
        };

        let keep = |key: &str| key != CONTAINER_MARKER && key.starts_with(prefix);

        let mut keys = Vec::new();
        if recursive {
            for meta in self.backend.list(&full_prefix).await? {
                if let Some(key) = self.logical_key(&meta.location) {
                    if keep(&key) {
                        keys.push(key);
                    }
                }
            }
        } else {
            let result = self.backend.list_with_delimiter(&full_prefix).await?;
            for meta in result.objects {
                if let Some(key) = self.logical_key(&meta.location) {
                    if keep(&key) {
                        keys.push(key);
                    }
                }
            }
            for common in result.common_prefixes {
                if let Some(key) = self.logical_key(&common) {
                    if keep(&key) {
                        keys.push(format!("{key}/"));
                    }
                }
            }
        }
        Ok(keys)
    }

    /// Return size and last-modified time for a key.
    pub async fn stat(&self, key: &str) -> Result<ItemInfo> {
        let path = self.object_path(key)?;
        let meta = self
            .backend
            .head(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound { key: key.into() })?;
        Ok(ItemInfo {
            key: key.to_string(),
            size: meta.size as u64,
            modified: meta.last_modified,
        })
    }
}

#[cfg(test)]
impl Bucket {
    /// Open a handle backed by in-memory storage (test-only).
    pub fn memory(name: impl Into<String>) -> Result<Self> {
        Self::open(Backend::memory(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_container_idempotent() {
        let bucket = Bucket::memory("certs").unwrap();

        assert!(!bucket.container_exists().await.unwrap());

        // Two calls in a row, as if two processes raced at startup
        bucket.ensure_container().await.unwrap();
        bucket.ensure_container().await.unwrap();

        assert!(bucket.container_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_store_load_roundtrip() {
        let bucket = Bucket::memory("certs").unwrap();
        bucket.ensure_container().await.unwrap();

        let data = Bytes::from("crt data");
        bucket.store("example.com.crt", data.clone()).await.unwrap();
        let loaded = bucket.load("example.com.crt").await.unwrap();
        assert_eq!(loaded, data);

        // Overwrite fully replaces prior content
        let replaced = Bytes::from("new crt data");
        bucket
            .store("example.com.crt", replaced.clone())
            .await
            .unwrap();
        assert_eq!(bucket.load("example.com.crt").await.unwrap(), replaced);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let bucket = Bucket::memory("certs").unwrap();

        let err = bucket.load("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, StoreError::NotFound { key } if key == "missing"));
    }

    #[tokio::test]
    async fn test_delete_then_absent() {
        let bucket = Bucket::memory("certs").unwrap();

        bucket.store("a/b", Bytes::from("x")).await.unwrap();
        bucket.delete("a/b").await.unwrap();

        assert!(!bucket.exists("a/b").await.unwrap());
        assert!(bucket.load("a/b").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_is_error() {
        let bucket = Bucket::memory("certs").unwrap();

        let err = bucket.delete("never-stored").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let bucket = Bucket::memory("certs").unwrap();

        assert!(matches!(
            bucket.store("", Bytes::new()).await.unwrap_err(),
            StoreError::InvalidKey { .. }
        ));
        assert!(matches!(
            bucket.load("").await.unwrap_err(),
            StoreError::InvalidKey { .. }
        ));
        assert!(matches!(
            bucket.stat("").await.unwrap_err(),
            StoreError::InvalidKey { .. }
        ));
    }

    #[tokio::test]
    async fn test_invalid_container_name() {
        assert!(Bucket::memory("").is_err());
        assert!(Bucket::memory("a/b").is_err());
    }

    #[tokio::test]
    async fn test_list_recursive_and_delimited() {
        let bucket = Bucket::memory("certs").unwrap();
        bucket.ensure_container().await.unwrap();

        for key in [
            "acme/example.com/site.crt",
            "acme/example.com/site.key",
            "acme/other.org/site.crt",
            "acme/meta.json",
        ] {
            bucket.store(key, Bytes::from("x")).await.unwrap();
        }

        let mut all = bucket.list("acme", true).await.unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                "acme/example.com/site.crt",
                "acme/example.com/site.key",
                "acme/meta.json",
                "acme/other.org/site.crt",
            ]
        );

        let mut shallow = bucket.list("acme/", false).await.unwrap();
        shallow.sort();
        assert_eq!(
            shallow,
            vec!["acme/example.com/", "acme/meta.json", "acme/other.org/"]
        );

        // Without the trailing delimiter everything collapses to one marker
        assert_eq!(bucket.list("acme", false).await.unwrap(), vec!["acme/"]);
    }

    #[tokio::test]
    async fn test_list_partial_segment_prefix() {
        let bucket = Bucket::memory("certs").unwrap();
        bucket.ensure_container().await.unwrap();

        for key in [
            "acme/example.com.crt",
            "acme/example.org.crt",
            "acme/example.com/site.key",
            "acme/other.net.crt",
        ] {
            bucket.store(key, Bytes::from("x")).await.unwrap();
        }

        // A prefix that splits a path segment still matches string-wise
        let mut keys = bucket.list("acme/example", true).await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "acme/example.com.crt",
                "acme/example.com/site.key",
                "acme/example.org.crt",
            ]
        );

        let mut shallow = bucket.list("acme/example", false).await.unwrap();
        shallow.sort();
        assert_eq!(
            shallow,
            vec![
                "acme/example.com.crt",
                "acme/example.com/",
                "acme/example.org.crt",
            ]
        );
    }

    #[tokio::test]
    async fn test_list_hides_container_marker() {
        let bucket = Bucket::memory("certs").unwrap();
        bucket.ensure_container().await.unwrap();
        bucket.store("only-key", Bytes::from("x")).await.unwrap();

        assert_eq!(bucket.list("", true).await.unwrap(), vec!["only-key"]);
        assert_eq!(bucket.list("", false).await.unwrap(), vec!["only-key"]);
    }

    #[tokio::test]
    async fn test_stat() {
        let bucket = Bucket::memory("certs").unwrap();

        bucket.store("a/b/c", Bytes::from("12345")).await.unwrap();
        let info = bucket.stat("a/b/c").await.unwrap();
        assert_eq!(info.key, "a/b/c");
        assert_eq!(info.size, 5);

        assert!(bucket.stat("a/b/missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_container_drains_everything() {
        let bucket = Bucket::memory("certs").unwrap();
        bucket.ensure_container().await.unwrap();

        bucket.store("a/1", Bytes::from("x")).await.unwrap();
        bucket.store("b/2", Bytes::from("y")).await.unwrap();

        bucket.delete_container().await.unwrap();

        assert!(!bucket.container_exists().await.unwrap());
        assert!(bucket.list("", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let backend = Backend::memory();
        let one = Bucket::open(backend.clone(), "one").unwrap();
        let two = Bucket::open(backend, "two").unwrap();

        one.store("shared-key", Bytes::from("from one")).await.unwrap();

        assert!(!two.exists("shared-key").await.unwrap());
        assert_eq!(
            one.load("shared-key").await.unwrap(),
            Bytes::from("from one")
        );
    }
}
