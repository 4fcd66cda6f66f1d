/// Cache-aside lookup.
///
/// Returns the cached value when present. Otherwise awaits `$block`, stores
/// its result under `$key` for `$ttl` seconds and returns it. Expands to an
/// `AppResult`, so it is meant as the tail of a function returning one.
///
/// # Example
/// ```rust,ignore
/// async fn movies(store: &dyn CatalogStore, cache: &Cache) -> AppResult<Vec<Movie>> {
///     cached!(cache, CacheKey::MovieList(MoviePage::all()), 3600, async {
///         store.list_movies(MoviePage::all()).await
///     })
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await? {
            Some(cached) => Ok(cached),
            None => {
                let value = $block.await?;
                $cache.set_in_cache(&key, &value, $ttl).await?;
                Ok(value)
            }
        }
    }};
}
