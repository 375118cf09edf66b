use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracker_store::TrendPeriod;

use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_TOP_CAMERAS: i64 = 10;
const DEFAULT_ACTIVITY: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let stats = state.store().dashboard_stats().await?;
    Ok(Json(json!({ "stats": stats })))
}

pub async fn trends(
    State(state): State<AppState>,
    query: Result<Query<TrendQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let period = TrendPeriod::parse(query.period.as_deref());
    let trends = state.store().detection_trends(period).await?;
    Ok(Json(json!({ "trends": trends })))
}

pub async fn top_cameras(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let cameras = state
        .store()
        .top_cameras(query.limit.unwrap_or(DEFAULT_TOP_CAMERAS))
        .await?;
    Ok(Json(json!({ "cameras": cameras })))
}

pub async fn heatmap(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(range) = query?;
    let points = state.store().heatmap(range.start_date, range.end_date).await?;
    Ok(Json(json!({ "heatmapData": points })))
}

pub async fn success_rate(State(state): State<AppState>) -> ApiResult<Json<tracker_store::SuccessRate>> {
    Ok(Json(state.store().search_success_rate().await?))
}

pub async fn activity(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let activities = state
        .store()
        .recent_activity(query.limit.unwrap_or(DEFAULT_ACTIVITY))
        .await?;
    Ok(Json(json!({ "activities": activities })))
}
