use std::fmt::Display;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::error::AppResult;
use crate::models::MoviePage;

pub mod memory;
pub mod redis;

mod macros;

pub use self::memory::MemoryBackend;
pub use self::redis::{create_redis_client, RedisBackend};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    MovieList(MoviePage),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieList(page) if page.is_unbounded() => write!(f, "movie_list"),
            CacheKey::MovieList(page) => {
                write!(f, "movie_list:")?;
                if let Some(limit) = page.limit {
                    write!(f, "limit={}", limit)?;
                }
                write!(f, ":offset={}", page.offset.unwrap_or(0))
            }
        }
    }
}

/// Key-value storage with per-entry expiry
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> AppResult<()>;

    /// Drops every entry, not only the ones this service wrote
    async fn clear_all(&self) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Cache handler for storing and retrieving JSON values
///
/// Created once at start-up and shared by the read path and whatever
/// invalidates it.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Cache held in this process only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Opens Redis when `REDIS_URL` is set, otherwise an in-process cache
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        match &config.redis_url {
            Some(url) => {
                let backend = RedisBackend::connect(url).await?;
                tracing::info!("Connected to Redis");
                Ok(Self::new(Arc::new(backend)))
            }
            None => {
                tracing::warn!("REDIS_URL is not set; using an in-process cache");
                Ok(Self::in_memory())
            }
        }
    }

    /// Retrieves a value from the cache by key
    ///
    /// If the key exists in the cache, the value is deserialized and returned.
    /// If the key does not exist or has expired, `None` is returned.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let key = key.to_string();
        match self.backend.get(&key).await? {
            Some(json) => {
                tracing::debug!(key = %key, "Cache hit");
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => {
                tracing::debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Serializes the value and stores it under `key` for `ttl` seconds
    pub async fn set_in_cache<T: serde::Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: u64,
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;
        self.backend.set(&key.to_string(), json, ttl).await
    }

    /// Removes every cached entry
    pub async fn clear_all(&self) -> AppResult<()> {
        self.backend.clear_all().await?;
        tracing::info!(backend = self.backend.name(), "Cache cleared");
        Ok(())
    }
}
