use chrono::NaiveDate;
use serde::Deserialize;

pub mod engagement;
pub mod movie;
pub mod user;

pub use engagement::{Comment, Favorite, Like, Owned};
pub use movie::{Movie, MoviePage, NewMovie};
pub use user::{NewUser, User, UserProfile};

// ============================================================================
// TMDb API Types
// ============================================================================

/// Envelope shared by the trending and recommendations endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

/// One entry of a TMDb result list
///
/// Every field is optional so a single incomplete record can be detected and
/// skipped instead of failing the whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: Option<i64>,
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Column widths of `movies.title` and `movies.poster_url`
pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_POSTER_URL_LEN: usize = 500;

/// Reason a catalog record was not turned into a movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRejection {
    Unreadable(String),
    MissingId,
    MissingTitle,
    TitleTooLong(usize),
    PosterUrlTooLong(usize),
}

impl std::fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordRejection::Unreadable(e) => write!(f, "unreadable record: {}", e),
            RecordRejection::MissingId => write!(f, "record has no id"),
            RecordRejection::MissingTitle => write!(f, "record has no title"),
            RecordRejection::TitleTooLong(len) => {
                write!(f, "title has {} characters, limit is {}", len, MAX_TITLE_LEN)
            }
            RecordRejection::PosterUrlTooLong(len) => write!(
                f,
                "poster url has {} characters, limit is {}",
                len, MAX_POSTER_URL_LEN
            ),
        }
    }
}

impl TmdbMovie {
    /// Parses a raw result entry
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordRejection> {
        serde_json::from_value(value).map_err(|e| RecordRejection::Unreadable(e.to_string()))
    }

    /// Builds the row to persist, prefixing the poster path with `image_base_url`
    pub fn into_new_movie(self, image_base_url: &str) -> Result<NewMovie, RecordRejection> {
        let external_id = self.id.ok_or(RecordRejection::MissingId)?;
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(RecordRejection::MissingTitle)?;
        let title_len = title.chars().count();
        if title_len > MAX_TITLE_LEN {
            return Err(RecordRejection::TitleTooLong(title_len));
        }

        let poster_url = self
            .poster_path
            .filter(|p| !p.trim().is_empty())
            .map(|path| poster_url(image_base_url, &path));
        if let Some(url) = &poster_url {
            let url_len = url.chars().count();
            if url_len > MAX_POSTER_URL_LEN {
                return Err(RecordRejection::PosterUrlTooLong(url_len));
            }
        }

        let release_date = self
            .release_date
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());

        Ok(NewMovie {
            title,
            external_id,
            poster_url,
            release_date,
        })
    }
}

fn poster_url(image_base_url: &str, path: &str) -> String {
    let base = image_base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

    #[test]
    fn test_tmdb_movie_to_new_movie() {
        let record = TmdbMovie::from_value(json!({
            "id": 42,
            "title": "X",
            "poster_path": "/x.jpg",
            "release_date": "2024-01-01",
            "vote_average": 7.5
        }))
        .unwrap();

        let movie = record.into_new_movie(IMAGE_BASE).unwrap();
        assert_eq!(movie.external_id, 42);
        assert_eq!(movie.title, "X");
        assert_eq!(
            movie.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/x.jpg")
        );
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_image_base_trailing_slash_not_doubled() {
        let record = TmdbMovie::from_value(json!({"id": 1, "title": "A", "poster_path": "/a.jpg"})).unwrap();
        let movie = record.into_new_movie("https://img.example/w500/").unwrap();
        assert_eq!(movie.poster_url.as_deref(), Some("https://img.example/w500/a.jpg"));
    }

    #[test]
    fn test_missing_optional_fields() {
        let record = TmdbMovie::from_value(json!({
            "id": 7,
            "title": "No Poster",
            "poster_path": null,
            "release_date": ""
        }))
        .unwrap();

        let movie = record.into_new_movie(IMAGE_BASE).unwrap();
        assert_eq!(movie.poster_url, None);
        assert_eq!(movie.release_date, None);
    }

    #[test]
    fn test_missing_id_rejected() {
        let record = TmdbMovie::from_value(json!({"title": "Nameless"})).unwrap();
        assert_eq!(
            record.into_new_movie(IMAGE_BASE),
            Err(RecordRejection::MissingId)
        );
    }

    #[test]
    fn test_blank_title_rejected() {
        let record = TmdbMovie::from_value(json!({"id": 3, "title": "  "})).unwrap();
        assert_eq!(
            record.into_new_movie(IMAGE_BASE),
            Err(RecordRejection::MissingTitle)
        );
    }

    #[test]
    fn test_title_longer_than_column_rejected() {
        let record = TmdbMovie::from_value(json!({"id": 3, "title": "a".repeat(256)})).unwrap();
        assert_eq!(
            record.into_new_movie(IMAGE_BASE),
            Err(RecordRejection::TitleTooLong(256))
        );

        let fits = TmdbMovie::from_value(json!({"id": 3, "title": "é".repeat(255)})).unwrap();
        assert!(fits.into_new_movie(IMAGE_BASE).is_ok());
    }

    #[test]
    fn test_poster_url_longer_than_column_rejected() {
        let path = format!("/{}.jpg", "p".repeat(500));
        let record = TmdbMovie::from_value(json!({"id": 4, "title": "Long", "poster_path": path})).unwrap();
        assert!(matches!(
            record.into_new_movie(IMAGE_BASE),
            Err(RecordRejection::PosterUrlTooLong(_))
        ));
    }

    #[test]
    fn test_wrong_id_type_unreadable() {
        let result = TmdbMovie::from_value(json!({"id": "abc", "title": "Bad"}));
        assert!(matches!(result, Err(RecordRejection::Unreadable(_))));
    }

    #[test]
    fn test_page_without_results_is_empty() {
        let page: TmdbPage = serde_json::from_value(json!({"page": 1})).unwrap();
        assert!(page.results.is_empty());
    }
}
