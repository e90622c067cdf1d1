//! Redis implementation of the key/value store.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use common::{AppError, AppResult};

use super::store::KeyValueStore;

/// Deletes the key only if it still holds the caller's token.
const RELEASE_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

/// Redis store wrapper with connection pooling.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Redis store connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let released: i32 = redis::cmd("EVAL")
            .arg(RELEASE_SCRIPT)
            .arg(1)
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(released == 1)
    }

    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<(u64, u64)> {
        let mut conn = self.connection.clone();
        let count: u64 = conn.incr(key, 1).await?;
        if count == 1 {
            conn.expire::<_, ()>(key, window_seconds as i64).await?;
        }

        // TTL is -1 if a previous EXPIRE was lost; repair it.
        let ttl: i64 = conn.ttl(key).await?;
        if ttl < 0 {
            conn.expire::<_, ()>(key, window_seconds as i64).await?;
            return Ok((count, window_seconds));
        }
        Ok((count, ttl as u64))
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(AppError::from)?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::internal(format!("unexpected PING reply: {}", pong)))
        }
    }
}
