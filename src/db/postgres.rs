use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{Comment, Favorite, Like, Movie, MoviePage, NewMovie, NewUser, User},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const MOVIE_COLUMNS: &str = "id, title, external_id, poster_url, release_date";

/// Postgres-backed [`CatalogStore`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies pending migrations
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = create_pool(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgStore {
    async fn create_user(&self, user: NewUser) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_movie_if_absent(&self, movie: NewMovie) -> AppResult<Option<Movie>> {
        let sql = format!(
            r#"
            INSERT INTO movies (title, external_id, poster_url, release_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (external_id) DO NOTHING
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        );

        let row = sqlx::query_as::<_, Movie>(&sql)
            .bind(&movie.title)
            .bind(movie.external_id)
            .bind(&movie.poster_url)
            .bind(movie.release_date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn movie_exists(&self, external_id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movies WHERE external_id = $1)")
                .bind(external_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_movie(&self, id: i64) -> AppResult<Option<Movie>> {
        let sql = format!("SELECT {} FROM movies WHERE id = $1", MOVIE_COLUMNS);
        let row = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_movies(&self, page: MoviePage) -> AppResult<Vec<Movie>> {
        // LIMIT NULL means no limit in Postgres
        let sql = format!(
            "SELECT {} FROM movies ORDER BY id LIMIT $1 OFFSET $2",
            MOVIE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Movie>(&sql)
            .bind(page.limit.map(i64::from))
            .bind(i64::from(page.offset.unwrap_or(0)))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn latest_movies(&self, limit: u32) -> AppResult<Vec<Movie>> {
        let sql = format!(
            "SELECT {} FROM movies ORDER BY release_date DESC NULLS LAST, id LIMIT $1",
            MOVIE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Movie>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn create_favorite(&self, user_id: i64, movie_id: i64) -> AppResult<Favorite> {
        let row = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (user_id, movie_id)
            VALUES ($1, $2)
            RETURNING id, user_id, movie_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_favorites(&self, user_id: i64) -> AppResult<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, movie_id, created_at FROM favorites WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_favorite(&self, id: i64) -> AppResult<Option<Favorite>> {
        let row = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, movie_id, created_at FROM favorites WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_favorite(&self, id: i64, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn create_comment(
        &self,
        user_id: i64,
        movie_id: i64,
        text: String,
    ) -> AppResult<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (user_id, movie_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, movie_id, text, created_at
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_comments(&self, user_id: i64, movie_id: Option<i64>) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, movie_id, text, created_at
            FROM comments
            WHERE user_id = $1 AND ($2::BIGINT IS NULL OR movie_id = $2)
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(
            "SELECT id, user_id, movie_id, text, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_comment(
        &self,
        id: i64,
        user_id: i64,
        text: String,
    ) -> AppResult<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments SET text = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, movie_id, text, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_comment(&self, id: i64, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn create_like(&self, user_id: i64, movie_id: i64) -> AppResult<Option<Like>> {
        let row = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (user_id, movie_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            RETURNING id, user_id, movie_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_likes(&self, user_id: i64) -> AppResult<Vec<Like>> {
        let rows = sqlx::query_as::<_, Like>(
            "SELECT id, user_id, movie_id, created_at FROM likes WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_like(&self, id: i64) -> AppResult<Option<Like>> {
        let row = sqlx::query_as::<_, Like>(
            "SELECT id, user_id, movie_id, created_at FROM likes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_like(&self, id: i64, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
