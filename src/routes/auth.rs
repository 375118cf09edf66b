use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(req) = payload?;
    if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let hash = state.passwords.hash(&req.password)?;
    let user = state
        .store()
        .create_user(req.username.trim(), req.email.trim(), &hash)
        .await?;
    let token = state.tokens.issue(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "token": token,
            "user": user,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password required".to_string()));
    }

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());
    let user = state
        .store()
        .find_user_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;
    if !state.passwords.verify(&req.password, &user.password_hash) {
        tracing::info!(username = %req.username, "Failed login");
        return Err(invalid());
    }

    state.store().touch_last_login(user.id).await?;
    let token = state.tokens.issue(&user)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": user,
    })))
}
