use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracker_store::{CameraPatch, NewCamera};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let cameras = state.store().list_cameras().await?;
    Ok(Json(json!({ "cameras": cameras })))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let camera = state.store().get_camera(&id).await?;
    Ok(Json(json!({ "camera": camera })))
}

pub async fn stats(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let stats = state.store().camera_stats(&id).await?;
    Ok(Json(json!({ "stats": stats })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewCamera>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    user.require_admin()?;
    let Json(new) = payload?;
    let camera = state.store().create_camera(new).await?;
    Ok((StatusCode::CREATED, Json(json!({ "camera": camera }))))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<CameraPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    user.require_admin()?;
    let Json(patch) = payload?;
    let camera = state.store().update_camera(&id, patch).await?;
    Ok(Json(json!({ "camera": camera })))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_admin()?;
    state.store().delete_camera(&id).await?;
    Ok(Json(json!({ "message": "Camera deleted successfully" })))
}
