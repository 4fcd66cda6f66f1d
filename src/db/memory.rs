use std::cmp::Reverse;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{Comment, Favorite, Like, Movie, MoviePage, NewMovie, NewUser, User},
};

/// In-process [`CatalogStore`] for development and tests
///
/// A single lock guards all tables, so every check-then-write below is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    movies: Vec<Movie>,
    favorites: Vec<Favorite>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn remove_owned<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    match rows.iter().position(matches) {
        Some(index) => {
            rows.remove(index);
            true
        }
        None => false,
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<Option<User>> {
        let mut tables = self.inner.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Ok(None);
        }

        let row = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(row.clone());
        Ok(Some(row))
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_movie_if_absent(&self, movie: NewMovie) -> AppResult<Option<Movie>> {
        let mut tables = self.inner.write().await;
        if tables
            .movies
            .iter()
            .any(|m| m.external_id == movie.external_id)
        {
            return Ok(None);
        }

        let row = Movie {
            id: tables.next_id(),
            title: movie.title,
            external_id: movie.external_id,
            poster_url: movie.poster_url,
            release_date: movie.release_date,
        };
        tables.movies.push(row.clone());
        Ok(Some(row))
    }

    async fn movie_exists(&self, external_id: i64) -> AppResult<bool> {
        let tables = self.inner.read().await;
        Ok(tables.movies.iter().any(|m| m.external_id == external_id))
    }

    async fn find_movie(&self, id: i64) -> AppResult<Option<Movie>> {
        let tables = self.inner.read().await;
        Ok(tables.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn list_movies(&self, page: MoviePage) -> AppResult<Vec<Movie>> {
        let tables = self.inner.read().await;
        Ok(page.apply(tables.movies.iter().cloned()))
    }

    async fn latest_movies(&self, limit: u32) -> AppResult<Vec<Movie>> {
        let tables = self.inner.read().await;
        let mut movies = tables.movies.clone();
        // None sorts below Some, so reversing puts undated movies last
        movies.sort_by_key(|m| (Reverse(m.release_date), m.id));
        movies.truncate(limit as usize);
        Ok(movies)
    }

    async fn create_favorite(&self, user_id: i64, movie_id: i64) -> AppResult<Favorite> {
        let mut tables = self.inner.write().await;
        let row = Favorite {
            id: tables.next_id(),
            user_id,
            movie_id,
            created_at: Utc::now(),
        };
        tables.favorites.push(row.clone());
        Ok(row)
    }

    async fn list_favorites(&self, user_id: i64) -> AppResult<Vec<Favorite>> {
        let tables = self.inner.read().await;
        Ok(tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_favorite(&self, id: i64) -> AppResult<Option<Favorite>> {
        let tables = self.inner.read().await;
        Ok(tables.favorites.iter().find(|f| f.id == id).cloned())
    }

    async fn delete_favorite(&self, id: i64, user_id: i64) -> AppResult<bool> {
        let mut tables = self.inner.write().await;
        Ok(remove_owned(&mut tables.favorites, |f| {
            f.id == id && f.user_id == user_id
        }))
    }

    async fn create_comment(
        &self,
        user_id: i64,
        movie_id: i64,
        text: String,
    ) -> AppResult<Comment> {
        let mut tables = self.inner.write().await;
        let row = Comment {
            id: tables.next_id(),
            user_id,
            movie_id,
            text,
            created_at: Utc::now(),
        };
        tables.comments.push(row.clone());
        Ok(row)
    }

    async fn list_comments(&self, user_id: i64, movie_id: Option<i64>) -> AppResult<Vec<Comment>> {
        let tables = self.inner.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.user_id == user_id)
            .filter(|c| movie_id.map_or(true, |m| c.movie_id == m))
            .cloned()
            .collect())
    }

    async fn find_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let tables = self.inner.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_comment(
        &self,
        id: i64,
        user_id: i64,
        text: String,
    ) -> AppResult<Option<Comment>> {
        let mut tables = self.inner.write().await;
        let comment = tables
            .comments
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id);

        Ok(comment.map(|c| {
            c.text = text;
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: i64, user_id: i64) -> AppResult<bool> {
        let mut tables = self.inner.write().await;
        Ok(remove_owned(&mut tables.comments, |c| {
            c.id == id && c.user_id == user_id
        }))
    }

    async fn create_like(&self, user_id: i64, movie_id: i64) -> AppResult<Option<Like>> {
        let mut tables = self.inner.write().await;
        if tables
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.movie_id == movie_id)
        {
            return Ok(None);
        }

        let row = Like {
            id: tables.next_id(),
            user_id,
            movie_id,
            created_at: Utc::now(),
        };
        tables.likes.push(row.clone());
        Ok(Some(row))
    }

    async fn list_likes(&self, user_id: i64) -> AppResult<Vec<Like>> {
        let tables = self.inner.read().await;
        Ok(tables
            .likes
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_like(&self, id: i64) -> AppResult<Option<Like>> {
        let tables = self.inner.read().await;
        Ok(tables.likes.iter().find(|l| l.id == id).cloned())
    }

    async fn delete_like(&self, id: i64, user_id: i64) -> AppResult<bool> {
        let mut tables = self.inner.write().await;
        Ok(remove_owned(&mut tables.likes, |l| {
            l.id == id && l.user_id == user_id
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_movie(external_id: i64, title: &str, release: Option<(i32, u32, u32)>) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            external_id,
            poster_url: None,
            release_date: release.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    #[tokio::test]
    async fn test_insert_movie_if_absent_is_idempotent() {
        let store = MemoryStore::new();

        let first = store
            .insert_movie_if_absent(new_movie(42, "X", None))
            .await
            .unwrap();
        let second = store
            .insert_movie_if_absent(new_movie(42, "X again", None))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert!(store.movie_exists(42).await.unwrap());
        assert_eq!(store.list_movies(MoviePage::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_movies_orders_by_release_date() {
        let store = MemoryStore::new();
        store
            .insert_movie_if_absent(new_movie(1, "Old", Some((1999, 1, 1))))
            .await
            .unwrap();
        store
            .insert_movie_if_absent(new_movie(2, "Undated", None))
            .await
            .unwrap();
        store
            .insert_movie_if_absent(new_movie(3, "New", Some((2024, 5, 1))))
            .await
            .unwrap();

        let titles: Vec<String> = store
            .latest_movies(10)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["New", "Old", "Undated"]);

        assert_eq!(store.latest_movies(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_like_unique_per_user_and_movie() {
        let store = MemoryStore::new();

        assert!(store.create_like(1, 10).await.unwrap().is_some());
        assert!(store.create_like(1, 10).await.unwrap().is_none());
        assert!(store.create_like(2, 10).await.unwrap().is_some());
        assert_eq!(store.list_likes(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let store = MemoryStore::new();
        let favorite = store.create_favorite(1, 10).await.unwrap();

        assert!(!store.delete_favorite(favorite.id, 2).await.unwrap());
        assert!(store.find_favorite(favorite.id).await.unwrap().is_some());

        assert!(store.delete_favorite(favorite.id, 1).await.unwrap());
        assert!(store.find_favorite(favorite.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_comments_filters_by_movie() {
        let store = MemoryStore::new();
        store.create_comment(1, 10, "a".into()).await.unwrap();
        store.create_comment(1, 11, "b".into()).await.unwrap();
        store.create_comment(2, 10, "c".into()).await.unwrap();

        assert_eq!(store.list_comments(1, None).await.unwrap().len(), 2);
        let on_movie = store.list_comments(1, Some(10)).await.unwrap();
        assert_eq!(on_movie.len(), 1);
        assert_eq!(on_movie[0].text, "a");
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        let user = NewUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
        };

        assert!(store.create_user(user.clone()).await.unwrap().is_some());
        assert!(store.create_user(user).await.unwrap().is_none());
    }
}
