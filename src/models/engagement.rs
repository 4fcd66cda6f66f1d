use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie on a user's favorites list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Favorite {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    #[serde(rename = "movie")]
    pub movie_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A user's comment on a movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    #[serde(rename = "movie")]
    pub movie_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A like; at most one per (user, movie)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    #[serde(rename = "movie")]
    pub movie_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Anything owned by the user who created it
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Favorite {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Like {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}
