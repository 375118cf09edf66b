pub mod alerts;
pub mod analytics;
pub mod auth;
pub mod cameras;
pub mod detections;
pub mod health;
pub mod searches;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::require_auth;
use crate::state::AppState;

/// Build the complete axum router
pub fn build_router(state: AppState) -> Router {
    // Routes that require a bearer token
    let protected = Router::new()
        .route("/api/searches", get(searches::list).post(searches::create))
        .route(
            "/api/searches/{id}",
            get(searches::get_one).put(searches::update).delete(searches::remove),
        )
        .route("/api/cameras", post(cameras::create))
        .route("/api/cameras/{id}", delete(cameras::remove).put(cameras::update))
        .route("/api/detections", post(detections::create))
        .route("/api/detections/{id}", get(detections::get_one))
        .route("/api/detections/search/{search_id}", get(detections::for_search))
        .route("/api/detections/stats/summary", get(detections::summary))
        .route("/api/detections/simulate/{search_id}", post(detections::simulate))
        .route("/api/analytics/dashboard", get(analytics::dashboard))
        .route("/api/analytics/trends/detections", get(analytics::trends))
        .route("/api/analytics/top-cameras", get(analytics::top_cameras))
        .route("/api/analytics/heatmap", get(analytics::heatmap))
        .route("/api/analytics/search-success-rate", get(analytics::success_rate))
        .route("/api/analytics/activity", get(analytics::activity))
        .route("/api/alerts", get(alerts::list).post(alerts::create))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Public routes
    let public = Router::new()
        .route("/api/health", get(health::get_health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/cameras", get(cameras::list))
        .route("/api/cameras/{id}", get(cameras::get_one))
        .route("/api/cameras/{id}/stats", get(cameras::stats))
        .route("/ws", get(tracker_hub::ws_connect));

    public
        .merge(protected)
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "Not found" })))
}
