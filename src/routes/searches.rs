use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracker_store::{NewSearch, SearchFilter, SearchPatch};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    filter: Result<Query<SearchFilter>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(filter) = filter?;
    let searches = state.store().list_searches(user.caller(), filter).await?;
    Ok(Json(json!({ "searches": searches })))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let search = state.store().get_search(user.caller(), &id).await?;
    Ok(Json(json!({ "search": search })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewSearch>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(new) = payload?;
    let search = state.store().create_search(user.caller(), new).await?;
    Ok((StatusCode::CREATED, Json(json!({ "search": search }))))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<SearchPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(patch) = payload?;
    let search = state.store().update_search(user.caller(), &id, patch).await?;
    Ok(Json(json!({ "search": search })))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.store().delete_search(user.caller(), &id).await?;
    Ok(Json(json!({ "message": "Search deleted successfully" })))
}
