use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult, middleware::AuthUser, models::Comment, services::engagement,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CommentFilter {
    pub movie: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub movie: i64,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateComment {
    pub text: String,
}

/// GET /api/comments?movie={id}
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(filter): Query<CommentFilter>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.store.list_comments(user.id, filter.movie).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment =
        engagement::add_comment(state.store.as_ref(), user.id, body.movie, &body.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Comment>> {
    Ok(Json(engagement::get_comment(state.store.as_ref(), id).await?))
}

/// PUT and PATCH /api/comments/{id}; only the text can change
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateComment>,
) -> AppResult<Json<Comment>> {
    let comment = engagement::edit_comment(state.store.as_ref(), user.id, id, &body.text).await?;
    Ok(Json(comment))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    engagement::remove_comment(state.store.as_ref(), user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
