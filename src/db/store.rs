use crate::{
    error::AppResult,
    models::{Comment, Favorite, Like, Movie, MoviePage, NewMovie, NewUser, User},
};

/// Persistence for movies, accounts and per-user engagement records
///
/// Uniqueness that matters for correctness (movie external id, username,
/// one like per user and movie) is enforced inside the store, so callers
/// never have to pair an existence check with a separate insert.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts the user, or returns `None` when the username is taken
    async fn create_user(&self, user: NewUser) -> AppResult<Option<User>>;

    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Inserts the movie unless one with the same external id exists.
    ///
    /// Returns the new row, or `None` when the movie was already present.
    async fn insert_movie_if_absent(&self, movie: NewMovie) -> AppResult<Option<Movie>>;

    async fn movie_exists(&self, external_id: i64) -> AppResult<bool>;

    async fn find_movie(&self, id: i64) -> AppResult<Option<Movie>>;

    /// Movies in insertion order
    async fn list_movies(&self, page: MoviePage) -> AppResult<Vec<Movie>>;

    /// Most recently released movies first, undated ones last
    async fn latest_movies(&self, limit: u32) -> AppResult<Vec<Movie>>;

    async fn create_favorite(&self, user_id: i64, movie_id: i64) -> AppResult<Favorite>;

    async fn list_favorites(&self, user_id: i64) -> AppResult<Vec<Favorite>>;

    async fn find_favorite(&self, id: i64) -> AppResult<Option<Favorite>>;

    /// Deletes the favorite only if `user_id` owns it
    async fn delete_favorite(&self, id: i64, user_id: i64) -> AppResult<bool>;

    async fn create_comment(&self, user_id: i64, movie_id: i64, text: String)
        -> AppResult<Comment>;

    async fn list_comments(&self, user_id: i64, movie_id: Option<i64>) -> AppResult<Vec<Comment>>;

    async fn find_comment(&self, id: i64) -> AppResult<Option<Comment>>;

    /// Replaces the text only if `user_id` owns the comment
    async fn update_comment(&self, id: i64, user_id: i64, text: String)
        -> AppResult<Option<Comment>>;

    async fn delete_comment(&self, id: i64, user_id: i64) -> AppResult<bool>;

    /// Inserts the like, or returns `None` when this user already liked the movie
    async fn create_like(&self, user_id: i64, movie_id: i64) -> AppResult<Option<Like>>;

    async fn list_likes(&self, user_id: i64) -> AppResult<Vec<Like>>;

    async fn find_like(&self, id: i64) -> AppResult<Option<Like>>;

    async fn delete_like(&self, id: i64, user_id: i64) -> AppResult<bool>;
}
