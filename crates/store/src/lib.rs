//! Object-storage backed certificate store.
//!
//! This crate gives a certificate-management component a uniform blob CRUD +
//! distributed-lock interface over cloud object storage (S3, GCS, local
//! filesystem, or in-memory for tests).
//!
//! # Features
//!
//! - Hierarchical `/`-delimited keys inside a lazily-created container
//! - Atomic full-blob writes; prefix listing with optional delimiter collapsing
//! - Cross-process mutual exclusion built on conditional object creation,
//!   with bounded blocking waits
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use store::{Backend, BackendConfig, Bucket};
//!
//! # async fn example() -> Result<(), store::StoreError> {
//! let backend = Backend::new(BackendConfig::default()).await?;
//! let bucket = Bucket::open(backend, "certs")?;
//! bucket.ensure_container().await?;
//!
//! bucket.lock("issue/example.com", Duration::from_secs(30)).await?;
//! bucket.store("acme/example.com/example.com.crt", Bytes::from("...")).await?;
//! bucket.unlock("issue/example.com").await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod bucket;
mod config;
mod error;
mod lock;

pub use backend::Backend;
pub use bucket::{Bucket, ItemInfo};
pub use config::BackendConfig;
pub use error::{Result, StoreError};
pub use lock::LockRecord;

pub mod prelude {
    pub use crate::backend::Backend;
    pub use crate::bucket::{Bucket, ItemInfo};
    pub use crate::config::BackendConfig;
    pub use crate::error::{Result, StoreError};
}
