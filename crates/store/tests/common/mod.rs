//! Shared test utilities for store integration tests
#![allow(dead_code)]

use store::{Backend, BackendConfig, Bucket};
use tempfile::TempDir;

pub const TEST_CONTAINER: &str = "certstash-test";

/// Install a log subscriber honoring RUST_LOG, once per test binary.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Set up an in-memory bucket with its container created.
pub async fn setup_memory() -> Bucket {
    init_tracing();
    let backend = Backend::new(BackendConfig::Memory).await.unwrap();
    let bucket = Bucket::open(backend, TEST_CONTAINER).unwrap();
    bucket.ensure_container().await.unwrap();
    bucket
}

/// Set up a local-filesystem bucket rooted in a fresh temp dir.
pub async fn setup_local() -> (Bucket, TempDir) {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let backend = Backend::new(BackendConfig::Local {
        path: temp_dir.path().to_path_buf(),
    })
    .await
    .unwrap();
    let bucket = Bucket::open(backend, TEST_CONTAINER).unwrap();
    bucket.ensure_container().await.unwrap();
    (bucket, temp_dir)
}
