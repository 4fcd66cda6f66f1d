use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};
use crate::state::AppState;

pub mod auth;
pub mod comments;
pub mod favorites;
pub mod likes;
pub mod movies;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts
        .route("/register", post(auth::register))
        .route("/token", post(auth::obtain_token))
        .route("/token/refresh", post(auth::refresh_token))
        .route("/me", get(auth::me))
        // Catalog
        .route("/movies", get(movies::list))
        .route("/movies/:id", get(movies::retrieve))
        .route("/recommendations", get(movies::recommendations))
        .route("/recommend/:external_id", post(movies::recommend))
        // Engagement
        .route("/favorites", get(favorites::list).post(favorites::create))
        .route(
            "/favorites/:id",
            get(favorites::retrieve).delete(favorites::destroy),
        )
        .route("/comments", get(comments::list).post(comments::create))
        .route(
            "/comments/:id",
            get(comments::retrieve)
                .put(comments::update)
                .patch(comments::update)
                .delete(comments::destroy),
        )
        .route("/likes", get(likes::list).post(likes::create))
        .route("/likes/:id", get(likes::retrieve).delete(likes::destroy))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
