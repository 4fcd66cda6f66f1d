use std::sync::Arc;

use crate::config::Config;

pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{Cache, CacheKey};
pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use store::CatalogStore;

/// Opens the configured store: Postgres when `DATABASE_URL` is set, memory otherwise
pub async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn CatalogStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            tracing::info!("Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; data lives in memory and is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
