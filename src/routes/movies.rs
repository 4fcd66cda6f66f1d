use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{Movie, MoviePage},
    services::{movies, IngestionJob},
    state::AppState,
};

/// GET /api/movies
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(page): Query<MoviePage>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies =
        movies::list_movies(state.store.as_ref(), &state.cache, page, state.movie_list_ttl).await?;
    Ok(Json(movies))
}

/// GET /api/movies/{id}
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Movie>> {
    Ok(Json(movies::get_movie(state.store.as_ref(), id).await?))
}

/// GET /api/recommendations
pub async fn recommendations(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(movies::latest_movies(state.store.as_ref()).await?))
}

/// POST /api/recommend/{external_id}
///
/// Queues the fetch and answers before it runs.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(external_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Value>)> {
    state.ingestion.submit(IngestionJob::Recommendations {
        seed_external_id: external_id,
    })?;
    tracing::info!(user_id = user.id, external_id = external_id, "Recommendation fetch queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Fetching recommendations in the background..." })),
    ))
}
