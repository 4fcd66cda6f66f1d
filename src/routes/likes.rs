use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult, middleware::AuthUser, models::Like, services::engagement, state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateLike {
    pub movie: i64,
}

pub async fn list(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<Json<Vec<Like>>> {
    Ok(Json(state.store.list_likes(user.id).await?))
}

/// A second like for the same movie is answered with 409
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateLike>,
) -> AppResult<(StatusCode, Json<Like>)> {
    let like = engagement::add_like(state.store.as_ref(), user.id, body.movie).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Like>> {
    Ok(Json(engagement::get_like(state.store.as_ref(), id).await?))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    engagement::remove_like(state.store.as_ref(), user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
