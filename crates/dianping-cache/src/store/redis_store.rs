//! Redis-backed cache store.

use super::CacheStore;
use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use dianping_config::RedisConfig;
use dianping_core::{DianpingError, DianpingResult, HealthCheck, HealthStatus};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info};

/// Compare-and-delete used to release owned locks.
const DELETE_IF_EQUALS_SCRIPT: &str = r#"
    if redis.call("get", KEYS[1]) == ARGV[1] then
        return redis.call("del", KEYS[1])
    else
        return 0
    end
"#;

/// Create a Redis connection pool and check it with a `PING`.
pub async fn create_pool(config: &RedisConfig) -> DianpingResult<Pool> {
    info!("Creating Redis connection pool...");

    let cfg = Config::from_url(&config.url);

    let pool = cfg
        .builder()
        .map_err(|e| DianpingError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size as usize)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| DianpingError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

    let mut conn = pool
        .get()
        .await
        .map_err(|e| DianpingError::Cache(format!("Failed to get Redis connection: {}", e)))?;
    redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await
        .map_err(|e| DianpingError::Cache(format!("Redis PING failed: {}", e)))?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Redis-based cache store.
#[derive(Clone)]
pub struct RedisCacheStore {
    pool: Pool,
}

impl RedisCacheStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> DianpingResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to get Redis connection: {}", e)))
    }
}

/// Converts a TTL to whole milliseconds, never below one.
fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> DianpingResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to get key '{}': {}", key, e)))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> DianpingResult<()> {
        let mut conn = self.get_conn().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        cmd.query_async::<()>(&mut *conn)
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to set key '{}': {}", key, e)))?;

        debug!(key = %key, ttl_ms = ttl.map(millis), "Stored key");
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> DianpingResult<bool> {
        let mut conn = self.get_conn().await?;

        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(millis(ttl))
            .query_async(&mut *conn)
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to set key '{}' NX: {}", key, e)))?;

        Ok(result.is_some())
    }

    async fn delete(&self, key: &str) -> DianpingResult<bool> {
        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to delete key '{}': {}", key, e)))?;

        debug!(key = %key, existed = deleted > 0, "Deleted key");
        Ok(deleted > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> DianpingResult<bool> {
        let mut conn = self.get_conn().await?;
        let updated: i64 = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl))
            .query_async(&mut *conn)
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to expire key '{}': {}", key, e)))?;
        Ok(updated == 1)
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> DianpingResult<bool> {
        let mut conn = self.get_conn().await?;
        let deleted: i64 = redis::Script::new(DELETE_IF_EQUALS_SCRIPT)
            .key(key)
            .arg(expected)
            .invoke_async(&mut *conn)
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to release key '{}': {}", key, e)))?;
        Ok(deleted == 1)
    }

    async fn ttl(&self, key: &str) -> DianpingResult<Option<Duration>> {
        let mut conn = self.get_conn().await?;
        let remaining: i64 = redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(|e| DianpingError::Cache(format!("Failed to read TTL of '{}': {}", key, e)))?;

        // -2: no such key, -1: no expiry
        Ok(u64::try_from(remaining).ok().map(Duration::from_millis))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[async_trait]
impl HealthCheck for RedisCacheStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn check(&self) -> HealthStatus {
        let mut conn = match self.get_conn().await {
            Ok(conn) => conn,
            Err(e) => return HealthStatus::Unhealthy(e.to_string()),
        };
        match redis::cmd("PING").query_async::<String>(&mut *conn).await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(format!("PING failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_rounds_up_to_one() {
        assert_eq!(millis(Duration::from_micros(10)), 1);
        assert_eq!(millis(Duration::from_secs(10)), 10_000);
    }
}
