//! Typed cache, rate limiting and lock operations over a [`KeyValueStore`].

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use common::{AppError, AppResult};

use super::store::{KeyValueStore, MemoryStore};
use crate::config::LockConfig;

/// Cache key prefix for billing summaries
pub const CACHE_PREFIX_SUMMARY: &str = "billing_summary:";

/// Cache key prefix for rate limit counters
pub const CACHE_PREFIX_RATE_LIMIT: &str = "rate_limit:";

/// Cache key prefix for locks
pub const CACHE_PREFIX_LOCK: &str = "lock:";

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub count: u64,
    pub allowed: bool,
    /// Seconds until the current window resets
    pub reset_seconds: u64,
}

/// Cache handle shared by services and middleware.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cache over a fresh in-process store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Get a value from cache. Undecodable entries count as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Set a value in cache with a TTL in seconds.
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;
        self.store.set_ex(key, &json, ttl_seconds).await
    }

    /// Delete a value from cache.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.store.delete(key).await
    }

    /// Check store connectivity.
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    // =========================================================================
    // Rate Limiting Operations
    // =========================================================================

    /// Count a request against the fixed window for `identifier`.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<RateLimitStatus> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let (count, reset_seconds) = self.store.incr_window(&key, window_seconds).await?;

        Ok(RateLimitStatus {
            count,
            allowed: count <= max_requests,
            reset_seconds,
        })
    }

    // =========================================================================
    // Lock Operations
    // =========================================================================

    /// Acquire an exclusive lock on `resource`, retrying per `options`.
    ///
    /// The returned guard releases the lock when dropped; call
    /// [`LockGuard::release`] to release it eagerly and observe errors.
    pub async fn acquire_lock(&self, resource: &str, options: LockConfig) -> AppResult<LockGuard> {
        let key = format!("{}{}", CACHE_PREFIX_LOCK, resource);
        let token = Uuid::new_v4().to_string();

        for attempt in 0..=options.retries {
            if self.store.set_nx_ex(&key, &token, options.ttl_seconds).await? {
                tracing::debug!(resource = %resource, attempt, "Lock acquired");
                return Ok(LockGuard {
                    store: self.store.clone(),
                    key,
                    token,
                    released: false,
                });
            }

            if attempt < options.retries {
                sleep(Duration::from_millis(options.retry_delay_ms)).await;
            }
        }

        tracing::warn!(resource = %resource, "Failed to acquire lock after retries");
        Err(AppError::internal(format!(
            "Failed to acquire lock for resource: {}",
            resource
        )))
    }
}

// =============================================================================
// Lock Guard (RAII)
// =============================================================================

/// RAII guard for a store lock.
pub struct LockGuard {
    store: Arc<dyn KeyValueStore>,
    key: String,
    token: String,
    released: bool,
}

impl LockGuard {
    /// Release the lock now.
    pub async fn release(mut self) -> AppResult<()> {
        self.released = true;
        if self.store.delete_if_equals(&self.key, &self.token).await? {
            tracing::debug!(key = %self.key, "Lock released");
        }
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let store = self.store.clone();
        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);

        // Without a runtime the lock simply expires through its TTL.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                match store.delete_if_equals(&key, &token).await {
                    Ok(_) => tracing::debug!(key = %key, "Lock released on drop"),
                    Err(e) => tracing::error!(key = %key, error = %e, "Failed to release lock on drop"),
                }
            });
        }
    }
}
