//! Favorites, comments and likes.
//!
//! Any authenticated user may read a record; only the user who created it
//! may change or delete it.

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Comment, Favorite, Like, Owned},
};

fn ensure_owner<T: Owned>(record: &T, user_id: i64, kind: &str) -> AppResult<()> {
    if record.owner_id() == user_id {
        Ok(())
    } else {
        tracing::warn!(
            user_id = user_id,
            owner_id = record.owner_id(),
            kind = kind,
            "Rejected change to another user's record"
        );
        Err(AppError::Forbidden(format!(
            "You do not have permission to modify this {}.",
            kind
        )))
    }
}

async fn ensure_movie(store: &dyn CatalogStore, movie_id: i64) -> AppResult<()> {
    match store.find_movie(movie_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::InvalidInput(format!(
            "Invalid movie id \"{}\" - object does not exist.",
            movie_id
        ))),
    }
}

fn not_found(kind: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind, id))
}

// Favorites

pub async fn add_favorite(
    store: &dyn CatalogStore,
    user_id: i64,
    movie_id: i64,
) -> AppResult<Favorite> {
    ensure_movie(store, movie_id).await?;
    store.create_favorite(user_id, movie_id).await
}

pub async fn get_favorite(store: &dyn CatalogStore, id: i64) -> AppResult<Favorite> {
    store
        .find_favorite(id)
        .await?
        .ok_or_else(|| not_found("Favorite", id))
}

pub async fn remove_favorite(store: &dyn CatalogStore, user_id: i64, id: i64) -> AppResult<()> {
    let favorite = get_favorite(store, id).await?;
    ensure_owner(&favorite, user_id, "favorite")?;

    if store.delete_favorite(id, user_id).await? {
        Ok(())
    } else {
        Err(not_found("Favorite", id))
    }
}

// Comments

fn validate_text(text: &str) -> AppResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput(
            "Comment text may not be blank.".to_string(),
        ));
    }
    Ok(text.to_string())
}

pub async fn add_comment(
    store: &dyn CatalogStore,
    user_id: i64,
    movie_id: i64,
    text: &str,
) -> AppResult<Comment> {
    let text = validate_text(text)?;
    ensure_movie(store, movie_id).await?;
    store.create_comment(user_id, movie_id, text).await
}

pub async fn get_comment(store: &dyn CatalogStore, id: i64) -> AppResult<Comment> {
    store
        .find_comment(id)
        .await?
        .ok_or_else(|| not_found("Comment", id))
}

pub async fn edit_comment(
    store: &dyn CatalogStore,
    user_id: i64,
    id: i64,
    text: &str,
) -> AppResult<Comment> {
    let text = validate_text(text)?;
    let comment = get_comment(store, id).await?;
    ensure_owner(&comment, user_id, "comment")?;

    store
        .update_comment(id, user_id, text)
        .await?
        .ok_or_else(|| not_found("Comment", id))
}

pub async fn remove_comment(store: &dyn CatalogStore, user_id: i64, id: i64) -> AppResult<()> {
    let comment = get_comment(store, id).await?;
    ensure_owner(&comment, user_id, "comment")?;

    if store.delete_comment(id, user_id).await? {
        Ok(())
    } else {
        Err(not_found("Comment", id))
    }
}

// Likes

pub async fn add_like(store: &dyn CatalogStore, user_id: i64, movie_id: i64) -> AppResult<Like> {
    ensure_movie(store, movie_id).await?;
    store
        .create_like(user_id, movie_id)
        .await?
        .ok_or_else(|| AppError::Conflict("You have already liked this movie.".to_string()))
}

pub async fn get_like(store: &dyn CatalogStore, id: i64) -> AppResult<Like> {
    store
        .find_like(id)
        .await?
        .ok_or_else(|| not_found("Like", id))
}

pub async fn remove_like(store: &dyn CatalogStore, user_id: i64, id: i64) -> AppResult<()> {
    let like = get_like(store, id).await?;
    ensure_owner(&like, user_id, "like")?;

    if store.delete_like(id, user_id).await? {
        Ok(())
    } else {
        Err(not_found("Like", id))
    }
}
