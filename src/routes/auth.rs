use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::UserProfile,
    services::auth::{self, Registration, TokenPair},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<Registration>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let user = auth::register(state.store.as_ref(), form).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// POST /api/token
pub async fn obtain_token(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<TokenPair>> {
    let user =
        auth::authenticate(state.store.as_ref(), &credentials.username, &credentials.password)
            .await?;
    Ok(Json(state.auth.issue_pair(&user)?))
}

/// POST /api/token/refresh
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AccessToken>> {
    let access = state.auth.refresh(&body.refresh)?;
    Ok(Json(AccessToken { access }))
}

/// GET /api/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UserProfile>> {
    let account = state
        .store
        .find_user(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    Ok(Json(UserProfile::from(&account)))
}
