use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult, middleware::AuthUser, models::Favorite, services::engagement,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateFavorite {
    pub movie: i64,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Vec<Favorite>>> {
    Ok(Json(state.store.list_favorites(user.id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateFavorite>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    let favorite = engagement::add_favorite(state.store.as_ref(), user.id, body.movie).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Favorite>> {
    Ok(Json(engagement::get_favorite(state.store.as_ref(), id).await?))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    engagement::remove_favorite(state.store.as_ref(), user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
