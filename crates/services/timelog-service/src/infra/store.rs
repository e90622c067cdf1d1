//! Key/value store abstraction with expiring keys.
//!
//! Every key written through this trait carries a TTL; nothing is stored
//! forever. Implementations: [`RedisStore`](super::RedisStore) for shared
//! deployments and [`MemoryStore`] for a single process or tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::{Duration, Instant};

use common::{AppError, AppResult};

/// Minimal command set needed for caching, rate limiting and locks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value that expires after `ttl_seconds`.
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()>;

    /// Set only if the key is absent. Returns whether the value was written.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<bool>;

    /// Delete a key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Delete a key only while it still holds `value`.
    async fn delete_if_equals(&self, key: &str, value: &str) -> AppResult<bool>;

    /// Increment a counter; a new counter expires after `window_seconds`.
    ///
    /// Returns the new count and the seconds left before the counter resets.
    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<(u64, u64)>;

    /// Check connectivity.
    async fn ping(&self) -> AppResult<()>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process store backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, Entry>, Instant) -> R) -> AppResult<R> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::internal("memory store mutex poisoned"))?;
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(f(&mut entries, now))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.with_entries(|entries, _| entries.get(key).map(|e| e.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        self.with_entries(|entries, now| {
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: now + Duration::from_secs(ttl_seconds),
                },
            );
        })
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<bool> {
        self.with_entries(|entries, now| {
            if entries.contains_key(key) {
                return false;
            }
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: now + Duration::from_secs(ttl_seconds),
                },
            );
            true
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.with_entries(|entries, _| {
            entries.remove(key);
        })
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> AppResult<bool> {
        self.with_entries(|entries, _| match entries.get(key) {
            Some(entry) if entry.value == value => {
                entries.remove(key);
                true
            }
            _ => false,
        })
    }

    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<(u64, u64)> {
        self.with_entries(|entries, now| {
            let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: now + Duration::from_secs(window_seconds),
            });
            let count = entry.value.parse::<u64>().unwrap_or(0) + 1;
            entry.value = count.to_string();
            let ttl = entry.expires_at.saturating_duration_since(now);
            (count, ttl.as_secs_f64().ceil() as u64)
        })
    }

    async fn ping(&self) -> AppResult<()> {
        self.with_entries(|_, _| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_values_expire_after_ttl() {
        let store = MemoryStore::new();
        store.set_ex("summary:p1", "{}", 30).await.unwrap();
        assert_eq!(store.get("summary:p1").await.unwrap().as_deref(), Some("{}"));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.get("summary:p1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_nx_respects_existing_until_expiry() {
        let store = MemoryStore::new();
        assert!(store.set_nx_ex("lock:a", "one", 5).await.unwrap());
        assert!(!store.set_nx_ex("lock:a", "two", 5).await.unwrap());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(store.set_nx_ex("lock:a", "two", 5).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_if_equals_checks_owner() {
        let store = MemoryStore::new();
        store.set_nx_ex("lock:a", "owner", 5).await.unwrap();

        assert!(!store.delete_if_equals("lock:a", "intruder").await.unwrap());
        assert!(store.delete_if_equals("lock:a", "owner").await.unwrap());
        assert_eq!(store.get("lock:a").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incr_window_resets() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_window("rl:ip", 60).await.unwrap(), (1, 60));
        assert_eq!(store.incr_window("rl:ip", 60).await.unwrap().0, 2);

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(store.incr_window("rl:ip", 60).await.unwrap(), (3, 40));

        tokio::time::advance(Duration::from_secs(41)).await;
        assert_eq!(store.incr_window("rl:ip", 60).await.unwrap().0, 1);
    }
}
