//! External movie catalog (TMDb)
//!
//! Two read-only endpoints feed ingestion:
//! 1. Trending: /trending/movie/week → weekly trending movies
//! 2. Recommendations: /movie/{id}/recommendations → movies similar to a seed
//!
//! Both answer with `{"results": [...]}`. Entries are handed back unparsed so
//! one malformed record can be skipped by the caller without losing the page.

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::TmdbPage,
};

/// Source of movie records for ingestion
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Movies trending this week
    async fn trending(&self) -> AppResult<Vec<serde_json::Value>>;

    /// Movies recommended for the movie with the given catalog id
    async fn recommendations(&self, seed_external_id: i64) -> AppResult<Vec<serde_json::Value>>;

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_results(&self, path: &str) -> AppResult<Vec<serde_json::Value>> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDb API returned status {}: {}",
                status, body
            )));
        }

        let page: TmdbPage = response.json().await?;

        tracing::debug!(
            path = %path,
            results = page.results.len(),
            provider = "tmdb",
            "Catalog page fetched"
        );

        Ok(page.results)
    }
}

#[async_trait::async_trait]
impl CatalogClient for TmdbClient {
    async fn trending(&self) -> AppResult<Vec<serde_json::Value>> {
        self.fetch_results("/trending/movie/week").await
    }

    async fn recommendations(&self, seed_external_id: i64) -> AppResult<Vec<serde_json::Value>> {
        self.fetch_results(&format!("/movie/{}/recommendations", seed_external_id))
            .await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
