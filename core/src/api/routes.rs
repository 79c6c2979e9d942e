use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{
    handlers::{cron, result},
    AppState,
};

/// Trade exports of several years easily exceed axum's default 2 MB limit.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/result", post(result))
        .route("/cron", get(cron))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
