//! Distributed locking over the object store.
//!
//! Mutual exclusion across independent processes with no lock service: a
//! lock is a marker blob at a deterministic key, and the backing store's
//! conditional create is the only arbiter of ownership. Whoever creates the
//! marker holds the lock; deleting it releases. Ownership is positional -
//! the record carries a holder id for diagnostics, but release does not
//! check it.
//!
//! Acquisition polls with exponential backoff plus jitter, capped at a
//! maximum poll interval, and always under a caller-supplied wait bound so
//! a crashed holder can never strand waiters forever.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::bucket::Bucket;
use crate::error::{Result, StoreError};

/// Suffix appended to a lock name to form its marker key.
const LOCK_SUFFIX: &str = ".lock";

/// Initial poll backoff.
const BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Maximum poll interval once backoff has grown.
const BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Maximum random jitter added to each poll delay.
const JITTER_MAX_MS: u64 = 50;

/// Contents of a lock marker blob.
///
/// Purely diagnostic: the marker's existence is what encodes "locked".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    /// Handle that created the marker
    pub holder: String,
    /// When the marker was created
    pub acquired_at: DateTime<Utc>,
}

impl Bucket {
    fn lock_path(&self, name: &str) -> Result<ObjectPath> {
        if name.is_empty() {
            return Err(StoreError::InvalidKey { key: name.into() });
        }
        self.object_path(&format!("{name}{LOCK_SUFFIX}"))
    }

    /// Attempt to acquire a named lock without waiting.
    ///
    /// Returns `true` if this call took the lock, `false` if another holder
    /// owns it. The store's conditional create guarantees exactly one of any
    /// set of racing callers wins.
    pub async fn try_lock(&self, name: &str) -> Result<bool> {
        let path = self.lock_path(name)?;
        let record = LockRecord {
            holder: self.holder.clone(),
            acquired_at: Utc::now(),
        };
        let data = Bytes::from(serde_json::to_vec(&record)?);

        let acquired = self.backend().put_if_absent(&path, data).await?;
        if acquired {
            debug!(container = %self.name(), lock = %name, "lock acquired");
        }
        Ok(acquired)
    }

    /// Acquire a named lock, blocking up to `wait`.
    ///
    /// Polls the marker with exponential backoff and jitter while another
    /// holder owns it. Errors other than "already held" propagate
    /// immediately without retry. When `wait` elapses without acquisition,
    /// fails with [`StoreError::LockTimeout`].
    pub async fn lock(&self, name: &str, wait: Duration) -> Result<()> {
        let deadline = Instant::now() + wait;
        let mut backoff = BACKOFF_BASE;

        loop {
            if self.try_lock(name).await? {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(StoreError::LockTimeout {
                    name: name.into(),
                    waited: wait,
                });
            }

            let jitter = Duration::from_millis(rand::random_range(0..JITTER_MAX_MS));
            let delay = (backoff + jitter).min(deadline - now);
            trace!(container = %self.name(), lock = %name, delay = ?delay, "lock held elsewhere, waiting");
            tokio::time::sleep(delay).await;
            backoff = backoff.saturating_mul(2).min(BACKOFF_MAX);
        }
    }

    /// Release a named lock by deleting its marker.
    ///
    /// Fails with [`StoreError::NotLocked`] if the marker does not exist:
    /// unlocking something never locked is a caller bug, not a no-op.
    pub async fn unlock(&self, name: &str) -> Result<()> {
        let path = self.lock_path(name)?;
        if !self.backend().delete(&path).await? {
            return Err(StoreError::NotLocked { name: name.into() });
        }
        debug!(container = %self.name(), lock = %name, "lock released");
        Ok(())
    }

    /// Read the current lock record, if the lock is held.
    ///
    /// Diagnostic only; the answer may be stale by the time it returns.
    pub async fn lock_record(&self, name: &str) -> Result<Option<LockRecord>> {
        let path = self.lock_path(name)?;
        match self.backend().get(&path).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }
}
