pub mod departments;
pub mod diagnostics;
pub mod it_accounts;
pub mod pc_laptops;

use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// 构建完整的 HTTP 应用（路由 + 中间件）
pub fn build_app(state: Arc<AppState>) -> Router {
    let origins = state
        .config
        .cors_allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(origins);

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/api/db-status", get(db_status))
        .nest("/api/it-accounts", it_accounts::router())
        .nest("/api/departments", departments::router())
        .nest("/api/pc-laptops", pc_laptops::router())
        .nest("/api/diagnostics", diagnostics::router())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "IT Desk API is running!"
}

/// 数据库连接状态
/// GET /api/db-status
async fn db_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = state.db.status();
    Json(json!({
        "connected": status.connected,
        "error": status.error,
    }))
}
