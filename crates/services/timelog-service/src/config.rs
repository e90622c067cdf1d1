//! Time log service configuration.

use std::env;

use common::{env_or, DatabaseConfig};

/// Time log service configuration.
#[derive(Debug, Clone)]
pub struct TimeLogServiceConfig {
    /// Database pool settings
    pub database: DatabaseConfig,
    /// Redis URL for the shared store; in-process store when absent
    pub redis_url: Option<String>,
    /// Billing summary cache TTL in seconds
    pub summary_cache_ttl_seconds: u64,
    /// Per-day quota lock settings
    pub lock: LockConfig,
}

/// Settings for the per-(user, day) quota lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    /// Lock expiry, bounding how long a crashed holder blocks the day
    pub ttl_seconds: u64,
    /// Acquisition attempts after the first one
    pub retries: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 10,
            retries: 50,
            retry_delay_ms: 50,
        }
    }
}

impl TimeLogServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                ),
            },
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            summary_cache_ttl_seconds: env_or(
                "SUMMARY_CACHE_TTL_SECONDS",
                defaults.summary_cache_ttl_seconds,
            ),
            lock: LockConfig {
                ttl_seconds: env_or("QUOTA_LOCK_TTL_SECONDS", defaults.lock.ttl_seconds),
                retries: env_or("QUOTA_LOCK_RETRIES", defaults.lock.retries),
                retry_delay_ms: env_or("QUOTA_LOCK_RETRY_DELAY_MS", defaults.lock.retry_delay_ms),
            },
        }
    }
}

impl Default for TimeLogServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            redis_url: None,
            summary_cache_ttl_seconds: 30,
            lock: LockConfig::default(),
        }
    }
}
