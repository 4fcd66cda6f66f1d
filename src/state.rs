use std::sync::Arc;

use crate::config::Config;
use crate::db::{Cache, CatalogStore};
use crate::services::auth::AuthKeys;
use crate::services::{
    CatalogClient, IngestionQueue, IngestionService, IngestionWorkerHandle, TmdbClient,
};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub cache: Cache,
    pub ingestion: IngestionQueue,
    pub auth: AuthKeys,
    /// Seconds a cached movie listing stays valid
    pub movie_list_ttl: u64,
}

impl AppState {
    /// Wires the ingestion workers around an already opened store and cache
    ///
    /// The returned handle must be shut down once the server has stopped so
    /// queued jobs get to finish.
    pub fn build(
        config: &Config,
        store: Arc<dyn CatalogStore>,
        cache: Cache,
        catalog: Arc<dyn CatalogClient>,
    ) -> (Arc<Self>, IngestionWorkerHandle) {
        let service = Arc::new(IngestionService::new(
            store.clone(),
            catalog,
            cache.clone(),
            config.tmdb_image_base_url.clone(),
        ));
        let (ingestion, handle) = IngestionQueue::start(
            service,
            config.ingestion_workers,
            config.ingestion_queue_capacity,
        );

        let state = Arc::new(Self {
            store,
            cache,
            ingestion,
            auth: AuthKeys::from_config(config),
            movie_list_ttl: config.movie_list_cache_ttl_secs,
        });

        (state, handle)
    }

    /// Opens every backend named in the configuration
    pub async fn from_config(config: &Config) -> anyhow::Result<(Arc<Self>, IngestionWorkerHandle)> {
        let store = crate::db::connect_store(config).await?;
        let cache = Cache::connect(config).await?;
        let catalog: Arc<dyn CatalogClient> = Arc::new(TmdbClient::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
        ));

        Ok(Self::build(config, store, cache, catalog))
    }
}
