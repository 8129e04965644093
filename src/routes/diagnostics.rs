use crate::{
    error::{AppError, Result},
    state::AppState,
};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const TABLES: [&str; 3] = ["it_account", "department", "pc_laptop"];

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(diagnostics))
}

/// 诊断端点（仅开发环境可用）
/// GET /api/diagnostics
async fn diagnostics(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    if !state.is_development() {
        return Err(AppError::forbidden("Diagnostics endpoint is only available in development"));
    }

    debug!("Running diagnostics endpoint");

    let mut counts = serde_json::Map::new();
    for table in TABLES {
        let total = match state.db.count(table).await {
            Ok(total) => total,
            Err(e) => {
                warn!("Could not count {}: {}", table, e);
                0
            }
        };
        counts.insert(table.to_string(), json!(total));
    }

    Ok(Json(json!({
        "success": true,
        "data": {
            "database": {
                "namespace": state.config.database_namespace,
                "name": state.config.database_name,
                "url": state.config.database_url,
                "status": state.db.status(),
            },
            "counts": counts,
        }
    })))
}
