use std::fmt::Display;
use std::sync::Arc;

use crate::{
    db::{Cache, CatalogStore},
    error::{AppError, AppResult},
    models::{Movie, NewMovie, TmdbMovie},
    services::catalog_client::CatalogClient,
};

/// A unit of ingestion work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionJob {
    /// Weekly trending list, pulled on a schedule
    Trending,
    /// Recommendations for one catalog movie, pulled on demand
    Recommendations { seed_external_id: i64 },
}

impl Display for IngestionJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionJob::Trending => write!(f, "trending"),
            IngestionJob::Recommendations { seed_external_id } => {
                write!(f, "recommendations:{}", seed_external_id)
            }
        }
    }
}

/// Result of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Completed {
        /// Movies inserted by this run
        created: usize,
        /// Movies already present
        existing: usize,
        /// Records dropped as malformed
        skipped: usize,
        /// Records the store refused
        failed: usize,
    },
    /// The catalog could not be read; nothing was written
    Failed { reason: String },
}

impl IngestOutcome {
    /// Number of newly created movies, zero for a failed run
    pub fn created(&self) -> usize {
        match self {
            IngestOutcome::Completed { created, .. } => *created,
            IngestOutcome::Failed { .. } => 0,
        }
    }

    /// True when the catalog was read and every well-formed record was stored
    pub fn is_success(&self) -> bool {
        matches!(self, IngestOutcome::Completed { failed: 0, .. })
    }
}

/// Pulls movies from the external catalog into the store
///
/// Runs never return an error: a catalog failure becomes
/// [`IngestOutcome::Failed`] and is logged, so a worker or the operator
/// command can keep going.
pub struct IngestionService {
    store: Arc<dyn CatalogStore>,
    catalog: Arc<dyn CatalogClient>,
    cache: Cache,
    image_base_url: String,
    invalidate_cache: bool,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        catalog: Arc<dyn CatalogClient>,
        cache: Cache,
        image_base_url: String,
    ) -> Self {
        Self {
            store,
            catalog,
            cache,
            image_base_url,
            invalidate_cache: true,
        }
    }

    /// Whether runs clear the cache; on by default
    pub fn with_cache_invalidation(mut self, enabled: bool) -> Self {
        self.invalidate_cache = enabled;
        self
    }

    /// Ingests this week's trending movies
    pub async fn ingest_trending(&self) -> IngestOutcome {
        self.run(IngestionJob::Trending).await
    }

    /// Ingests the movies recommended for `seed_external_id`
    pub async fn ingest_recommendations_for(&self, seed_external_id: i64) -> IngestOutcome {
        self.run(IngestionJob::Recommendations { seed_external_id })
            .await
    }

    #[tracing::instrument(skip_all, fields(job = %job, catalog = self.catalog.name()))]
    pub async fn run(&self, job: IngestionJob) -> IngestOutcome {
        tracing::info!("Ingestion started");

        let records = match job {
            IngestionJob::Trending => self.catalog.trending().await,
            IngestionJob::Recommendations { seed_external_id } => {
                self.catalog.recommendations(seed_external_id).await
            }
        };

        let records = match records {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch from external catalog");
                return IngestOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let outcome = self.store_records(records).await;

        // Rows written before a store failure are still visible to readers
        if self.invalidate_cache && outcome.created() > 0 {
            if let Err(e) = self.cache.clear_all().await {
                tracing::warn!(error = %e, "Failed to invalidate cache after ingestion");
            }
        }

        if let IngestOutcome::Completed {
            created,
            existing,
            skipped,
            failed,
        } = &outcome
        {
            tracing::info!(
                created = created,
                existing = existing,
                skipped = skipped,
                failed = failed,
                "Ingestion completed"
            );
        }

        outcome
    }

    /// Runs `job` for the operator command and reports it as a result
    ///
    /// Fails when the catalog could not be read or any record could not be
    /// stored. On success the whole cache is cleared, even if nothing new was
    /// created, unless cache invalidation is off.
    pub async fn run_to_completion(&self, job: IngestionJob) -> AppResult<usize> {
        match self.run(job).await {
            IngestOutcome::Completed {
                created, failed: 0, ..
            } => {
                if self.invalidate_cache {
                    self.cache.clear_all().await?;
                }
                Ok(created)
            }
            IngestOutcome::Completed {
                created, failed, ..
            } => Err(AppError::Internal(format!(
                "{} catalog records could not be saved ({} saved)",
                failed, created
            ))),
            IngestOutcome::Failed { reason } => Err(AppError::ExternalApi(reason)),
        }
    }

    async fn store_records(&self, records: Vec<serde_json::Value>) -> IngestOutcome {
        let mut created = 0;
        let mut existing = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for record in records {
            let movie = match TmdbMovie::from_value(record)
                .and_then(|m| m.into_new_movie(&self.image_base_url))
            {
                Ok(movie) => movie,
                Err(reason) => {
                    tracing::warn!(reason = %reason, "Skipping catalog record");
                    skipped += 1;
                    continue;
                }
            };

            let external_id = movie.external_id;
            match self.store_movie(movie).await {
                Ok(Some(saved)) => {
                    tracing::info!(
                        external_id = saved.external_id,
                        title = %saved.title,
                        "Saved new movie"
                    );
                    created += 1;
                }
                Ok(None) => existing += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        external_id = external_id,
                        "Failed to store catalog record"
                    );
                    failed += 1;
                }
            }
        }

        IngestOutcome::Completed {
            created,
            existing,
            skipped,
            failed,
        }
    }

    /// Inserts the movie unless its external id is already stored
    async fn store_movie(&self, movie: NewMovie) -> AppResult<Option<Movie>> {
        if self.store.movie_exists(movie.external_id).await? {
            return Ok(None);
        }
        // A concurrent run may have inserted it since the check above
        self.store.insert_movie_if_absent(movie).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockCatalogStore;
    use crate::db::MemoryStore;
    use crate::models::MoviePage;
    use crate::services::catalog_client::MockCatalogClient;
    use serde_json::json;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

    fn service(
        store: Arc<MemoryStore>,
        catalog: MockCatalogClient,
        cache: Cache,
    ) -> IngestionService {
        IngestionService::new(store, Arc::new(catalog), cache, IMAGE_BASE.to_string())
    }

    fn catalog_returning(results: Vec<serde_json::Value>) -> MockCatalogClient {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_name().return_const("mock");
        catalog
            .expect_trending()
            .returning(move || Ok(results.clone()));
        catalog
    }

    #[tokio::test]
    async fn test_ingest_creates_movie() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog_returning(vec![json!({
            "id": 42, "title": "X", "poster_path": "/x.jpg", "release_date": "2024-01-01"
        })]);
        let ingestion = service(store.clone(), catalog, Cache::in_memory());

        let outcome = ingestion.ingest_trending().await;
        assert_eq!(outcome.created(), 1);

        let movies = store.list_movies(MoviePage::all()).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].external_id, 42);
        assert!(movies[0].poster_url.as_deref().unwrap().ends_with("/x.jpg"));
    }

    #[tokio::test]
    async fn test_rerun_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog_returning(vec![json!({"id": 42, "title": "X"})]);
        let ingestion = service(store.clone(), catalog, Cache::in_memory());

        assert_eq!(ingestion.ingest_trending().await.created(), 1);
        let second = ingestion.ingest_trending().await;

        assert_eq!(
            second,
            IngestOutcome::Completed {
                created: 0,
                existing: 1,
                skipped: 0,
                failed: 0
            }
        );
        assert_eq!(store.list_movies(MoviePage::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog_returning(vec![
            json!({"title": "No id"}),
            json!({"id": 1}),
            json!({"id": "wrong type", "title": "Bad"}),
            json!({"id": 2, "title": "Good"}),
        ]);
        let ingestion = service(store.clone(), catalog, Cache::in_memory());

        let outcome = ingestion.ingest_trending().await;

        assert_eq!(
            outcome,
            IngestOutcome::Completed {
                created: 1,
                existing: 0,
                skipped: 3,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_external_failure_is_reported_not_raised() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = MockCatalogClient::new();
        catalog.expect_name().return_const("mock");
        catalog.expect_recommendations().returning(|_| {
            Err(AppError::ExternalApi(
                "TMDb API returned status 500 Internal Server Error: ".to_string(),
            ))
        });
        let ingestion = service(store.clone(), catalog, Cache::in_memory());

        let outcome = ingestion.ingest_recommendations_for(550).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.created(), 0);
        assert!(store.list_movies(MoviePage::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommendations_pass_seed_through() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = MockCatalogClient::new();
        catalog.expect_name().return_const("mock");
        catalog
            .expect_recommendations()
            .withf(|seed| *seed == 550)
            .times(1)
            .returning(|_| Ok(vec![json!({"id": 13, "title": "Forrest Gump"})]));
        let ingestion = service(store.clone(), catalog, Cache::in_memory());

        assert_eq!(ingestion.ingest_recommendations_for(550).await.created(), 1);
        assert!(store.movie_exists(13).await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_cleared_when_movies_created() {
        let store = Arc::new(MemoryStore::new());
        let cache = Cache::in_memory();
        let key = crate::db::CacheKey::MovieList(MoviePage::all());
        cache.set_in_cache(&key, &Vec::<i32>::new(), 3600).await.unwrap();

        let catalog = catalog_returning(vec![json!({"id": 5, "title": "Fresh"})]);
        let ingestion = service(store, catalog, cache.clone());
        ingestion.ingest_trending().await;

        let cached: Option<Vec<i32>> = cache.get_from_cache(&key).await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_cache_kept_when_nothing_created() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_movie_if_absent(NewMovie {
                title: "Known".to_string(),
                external_id: 5,
                poster_url: None,
                release_date: None,
            })
            .await
            .unwrap();
        let cache = Cache::in_memory();
        let key = crate::db::CacheKey::MovieList(MoviePage::all());
        cache.set_in_cache(&key, &vec![1], 3600).await.unwrap();

        let catalog = catalog_returning(vec![json!({"id": 5, "title": "Known"})]);
        let ingestion = service(store, catalog, cache.clone());
        ingestion.ingest_trending().await;

        let cached: Option<Vec<i32>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(cached, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_runs_never_duplicate() {
        let store = Arc::new(MemoryStore::new());
        let page: Vec<serde_json::Value> = (1..=20)
            .map(|id| json!({"id": id, "title": format!("Movie {id}")}))
            .collect();

        let a = Arc::new(service(
            store.clone(),
            catalog_returning(page.clone()),
            Cache::in_memory(),
        ));
        let b = Arc::new(service(
            store.clone(),
            catalog_returning(page[10..].to_vec()),
            Cache::in_memory(),
        ));

        let (ra, rb) = tokio::join!(
            tokio::spawn({
                let a = a.clone();
                async move { a.ingest_trending().await }
            }),
            tokio::spawn({
                let b = b.clone();
                async move { b.ingest_trending().await }
            }),
        );

        let created = ra.unwrap().created() + rb.unwrap().created();
        assert_eq!(created, 20);

        let mut ids: Vec<i64> = store
            .list_movies(MoviePage::all())
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.external_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(store.list_movies(MoviePage::all()).await.unwrap().len(), 20);
    }

    fn store_failing_second_insert() -> MockCatalogStore {
        let mut store = MockCatalogStore::new();
        store.expect_movie_exists().returning(|_| Ok(false));
        let mut inserts = 0;
        store
            .expect_insert_movie_if_absent()
            .times(3)
            .returning(move |movie| {
                inserts += 1;
                if inserts == 2 {
                    return Err(AppError::Internal(
                        "value too long for type character varying(255)".to_string(),
                    ));
                }
                Ok(Some(Movie {
                    id: inserts,
                    title: movie.title,
                    external_id: movie.external_id,
                    poster_url: movie.poster_url,
                    release_date: movie.release_date,
                }))
            });
        store
    }

    fn three_records() -> MockCatalogClient {
        catalog_returning(vec![
            json!({"id": 1, "title": "One"}),
            json!({"id": 2, "title": "Two"}),
            json!({"id": 3, "title": "Three"}),
        ])
    }

    #[tokio::test]
    async fn test_store_error_skips_record_and_continues() {
        let cache = Cache::in_memory();
        let key = crate::db::CacheKey::MovieList(MoviePage::all());
        cache.set_in_cache(&key, &vec![1], 3600).await.unwrap();

        let ingestion = IngestionService::new(
            Arc::new(store_failing_second_insert()),
            Arc::new(three_records()),
            cache.clone(),
            IMAGE_BASE.to_string(),
        );
        let outcome = ingestion.ingest_trending().await;

        assert_eq!(
            outcome,
            IngestOutcome::Completed {
                created: 2,
                existing: 0,
                skipped: 0,
                failed: 1
            }
        );
        assert!(!outcome.is_success());

        let cached: Option<Vec<i32>> = cache.get_from_cache(&key).await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_run_to_completion_reports_store_errors() {
        let ingestion = IngestionService::new(
            Arc::new(store_failing_second_insert()),
            Arc::new(three_records()),
            Cache::in_memory(),
            IMAGE_BASE.to_string(),
        );

        let result = ingestion.run_to_completion(IngestionJob::Trending).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_run_to_completion_clears_cache_without_new_movies() {
        let store = Arc::new(MemoryStore::new());
        let cache = Cache::in_memory();
        let key = crate::db::CacheKey::MovieList(MoviePage::all());
        cache.set_in_cache(&key, &vec![1], 3600).await.unwrap();

        let ingestion = service(store, catalog_returning(vec![]), cache.clone());
        let created = ingestion
            .run_to_completion(IngestionJob::Trending)
            .await
            .unwrap();

        assert_eq!(created, 0);
        let cached: Option<Vec<i32>> = cache.get_from_cache(&key).await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_invalidation_off_keeps_cache_after_new_movies() {
        let store = Arc::new(MemoryStore::new());
        let cache = Cache::in_memory();
        let key = crate::db::CacheKey::MovieList(MoviePage::all());
        cache.set_in_cache(&key, &vec![1], 3600).await.unwrap();

        let ingestion = service(
            store.clone(),
            catalog_returning(vec![json!({"id": 5, "title": "Fresh"})]),
            cache.clone(),
        )
        .with_cache_invalidation(false);
        let created = ingestion
            .run_to_completion(IngestionJob::Trending)
            .await
            .unwrap();

        assert_eq!(created, 1);
        assert!(store.movie_exists(5).await.unwrap());
        let cached: Option<Vec<i32>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(cached, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_run_to_completion_reports_catalog_failure() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_name().return_const("mock");
        catalog
            .expect_trending()
            .returning(|| Err(AppError::ExternalApi("status 500".to_string())));
        let ingestion = service(
            Arc::new(MemoryStore::new()),
            catalog,
            Cache::in_memory(),
        );

        let result = ingestion.run_to_completion(IngestionJob::Trending).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }
}
