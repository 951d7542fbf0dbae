use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{ApiJson, DataResponse};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::UserProfile;
use crate::services::auth::LoginResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password are required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password are required"))]
    pub password: String,
}

// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<DataResponse<LoginResponse>>, AppError> {
    req.validate()?;
    let response = state.auth.login(&req.username, &req.password).await?;
    Ok(DataResponse::new(response))
}

// GET /api/auth/me
async fn me(user: AuthUser) -> Json<DataResponse<UserProfile>> {
    DataResponse::new(user.profile())
}
