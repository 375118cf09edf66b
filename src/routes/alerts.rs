use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracker_store::NewAlert;

use super::analytics::LimitQuery;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_ALERTS: i64 = 50;

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let alerts = state
        .store()
        .list_alerts(query.limit.unwrap_or(DEFAULT_ALERTS))
        .await?;
    Ok(Json(json!({ "alerts": alerts })))
}

/// Persist an alert and push it to every connected socket
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewAlert>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    user.require_admin()?;
    let Json(new) = payload?;
    let alert = state.service.raise_alert(new).await?;
    Ok((StatusCode::CREATED, Json(json!({ "alert": alert }))))
}
