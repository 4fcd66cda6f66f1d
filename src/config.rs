use serde::Deserialize;

pub const INSECURE_JWT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. Falls back to an in-process store when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL. Falls back to an in-process cache when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDb API key
    #[serde(default)]
    pub tmdb_api_key: String,

    /// TMDb API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix prepended to poster paths returned by TMDb
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HMAC secret used to sign access and refresh tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_secs: i64,

    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_secs: i64,

    /// Time-to-live of the cached movie listing
    #[serde(default = "default_movie_list_ttl")]
    pub movie_list_cache_ttl_secs: u64,

    /// Maximum number of ingestion jobs running at once
    #[serde(default = "default_ingestion_workers")]
    pub ingestion_workers: usize,

    /// Jobs that may wait for a free worker before submissions are refused
    #[serde(default = "default_ingestion_queue_capacity")]
    pub ingestion_queue_capacity: usize,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_jwt_secret() -> String {
    INSECURE_JWT_SECRET.to_string()
}

fn default_access_ttl() -> i64 {
    300
}

fn default_refresh_ttl() -> i64 {
    86_400
}

fn default_movie_list_ttl() -> u64 {
    3600
}

fn default_ingestion_workers() -> usize {
    4
}

fn default_ingestion_queue_capacity() -> usize {
    64
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.ingestion_workers == 0 {
            anyhow::bail!("INGESTION_WORKERS must be at least 1");
        }
        if config.ingestion_queue_capacity == 0 {
            anyhow::bail!("INGESTION_QUEUE_CAPACITY must be at least 1");
        }

        Ok(config)
    }

    /// Emits warnings for settings that are only acceptable during development
    pub fn warn_insecure_defaults(&self) {
        if self.jwt_secret == INSECURE_JWT_SECRET {
            tracing::warn!("JWT_SECRET is not set; using an insecure development secret");
        }
        if self.tmdb_api_key.is_empty() {
            tracing::warn!("TMDB_API_KEY is not set; catalog ingestion will be rejected upstream");
        }
    }

    /// Database URL for tools that must write to durable storage
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL must be set; fetched movies would not be saved")
            })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_iter(vars(&[])).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.movie_list_cache_ttl_secs, 3600);
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_iter(vars(&[
            ("DATABASE_URL", "postgres://db/movies"),
            ("TMDB_API_KEY", "secret"),
            ("PORT", "9000"),
            ("INGESTION_WORKERS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://db/movies"));
        assert_eq!(config.tmdb_api_key, "secret");
        assert_eq!(config.port, 9000);
        assert_eq!(config.ingestion_workers, 2);
    }

    #[test]
    fn test_require_database_url() {
        let unset = Config::from_iter(vars(&[])).unwrap();
        assert!(unset.require_database_url().is_err());

        let set = Config::from_iter(vars(&[("DATABASE_URL", "postgres://db/movies")])).unwrap();
        assert_eq!(set.require_database_url().unwrap(), "postgres://db/movies");
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Config::from_iter(vars(&[("INGESTION_WORKERS", "0")])).is_err());
    }
}
