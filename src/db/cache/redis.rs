use redis::AsyncCommands;
use redis::Client;

use super::CacheBackend;
use crate::error::AppResult;

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed [`CacheBackend`]
///
/// Each call takes a multiplexed connection from the client; expiry is
/// delegated to Redis via `SETEX`.
#[derive(Clone)]
pub struct RedisBackend {
    redis_client: Client,
}

impl RedisBackend {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Opens the client and checks the server answers
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = create_redis_client(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self::new(client))
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key).await.map_err(|e| {
            tracing::warn!(error = %e, "Redis get failed");
            e
        })?;
        Ok(cached)
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn clear_all(&self) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These need a reachable Redis; run with `cargo test -- --ignored`.

    fn backend() -> RedisBackend {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        RedisBackend::new(create_redis_client(&redis_url).unwrap())
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(create_redis_client("not a url").is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_set_get() {
        let backend = backend();
        backend
            .set("test:movie_list", "[1,2]".to_string(), 60)
            .await
            .unwrap();

        let cached = backend.get("test:movie_list").await.unwrap();
        assert_eq!(cached.as_deref(), Some("[1,2]"));

        let mut conn = backend
            .redis_client
            .get_multiplexed_async_connection()
            .await
            .unwrap();
        let _: () = conn.del("test:movie_list").await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_miss() {
        let cached = backend().get("test:nonexistent_key_12345").await.unwrap();
        assert_eq!(cached, None);
    }
}
