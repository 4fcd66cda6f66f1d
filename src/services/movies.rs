use crate::{
    cached,
    db::{Cache, CacheKey, CatalogStore},
    error::{AppError, AppResult},
    models::{Movie, MoviePage},
};

/// Movies shown by the recommendations listing
pub const RECOMMENDATION_LIMIT: u32 = 10;

/// Lists movies, serving repeat calls from the cache for `ttl` seconds
///
/// Each distinct page is cached under its own key, the unpaged listing under
/// `movie_list`.
pub async fn list_movies(
    store: &dyn CatalogStore,
    cache: &Cache,
    page: MoviePage,
    ttl: u64,
) -> AppResult<Vec<Movie>> {
    cached!(cache, CacheKey::MovieList(page), ttl, async {
        let movies = store.list_movies(page).await?;
        tracing::info!(count = movies.len(), "Movie list loaded from store");
        Ok::<_, AppError>(movies)
    })
}

pub async fn get_movie(store: &dyn CatalogStore, id: i64) -> AppResult<Movie> {
    store
        .find_movie(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))
}

/// Newest releases, used as the recommendations listing
pub async fn latest_movies(store: &dyn CatalogStore) -> AppResult<Vec<Movie>> {
    store.latest_movies(RECOMMENDATION_LIMIT).await
}
