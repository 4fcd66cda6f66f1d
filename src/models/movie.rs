use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A movie ingested from the external catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// Identifier assigned by the external catalog, unique across all movies
    pub external_id: i64,
    pub poster_url: Option<String>,
    pub release_date: Option<NaiveDate>,
}

/// A movie that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub external_id: i64,
    pub poster_url: Option<String>,
    pub release_date: Option<NaiveDate>,
}

/// Window over the movie listing, both bounds optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct MoviePage {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl MoviePage {
    /// The whole listing
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit.is_none() && self.offset.unwrap_or(0) == 0
    }

    /// Applies the window to an already ordered sequence
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset.unwrap_or(0) as usize);
        match self.limit {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        }
    }
}
