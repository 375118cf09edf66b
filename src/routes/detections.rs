use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracker_store::{DetectionQuery, NewDetection};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn for_search(
    State(state): State<AppState>,
    Path(search_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let detections = state.store().detections_for_search(&search_id).await?;
    Ok(Json(json!({ "detections": detections })))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let detection = state.store().detection_with_search(&id).await?;
    Ok(Json(json!({ "detection": detection })))
}

/// Persist a detection; subscribed sockets receive it before the response is sent
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewDetection>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(new) = payload?;
    let detection = state.service.record_detection(new).await?;
    Ok((StatusCode::CREATED, Json(json!({ "detection": detection }))))
}

pub async fn summary(
    State(state): State<AppState>,
    query: Result<Query<DetectionQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let stats = state.store().detection_summary(query).await?;
    Ok(Json(json!({ "stats": stats })))
}

pub async fn simulate(
    State(state): State<AppState>,
    Path(search_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let detection = state.service.simulate_detection(&search_id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "detection": detection }))))
}
