//! Infrastructure layer - database, key/value store and locks.

mod cache;
mod db;
pub mod migrations;
mod redis_store;
mod store;

pub use cache::{
    Cache, LockGuard, RateLimitStatus, CACHE_PREFIX_LOCK, CACHE_PREFIX_RATE_LIMIT,
    CACHE_PREFIX_SUMMARY,
};
pub use db::Database;
pub use migrations::Migrator;
pub use redis_store::RedisStore;
pub use store::{KeyValueStore, MemoryStore};
