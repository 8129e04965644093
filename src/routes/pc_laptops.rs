use crate::{error::Result, models::ApiResponse, models::pc_laptop::*, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
}

/// List PC/laptop records
/// GET /api/pc-laptops
async fn list_assets(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Vec<PcLaptop>>>> {
    let assets = state.pc_laptop_service.list_assets().await?;
    Ok(Json(ApiResponse::list(assets)))
}

/// GET /api/pc-laptops/:id
async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PcLaptop>>> {
    let asset = state.pc_laptop_service.get_asset(&id).await?;
    Ok(Json(ApiResponse::success(asset)))
}

/// Register a machine under its asset tag
/// POST /api/pc-laptops
async fn create_asset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePcLaptopRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let asset = state.pc_laptop_service.create_asset(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": asset,
            "message": "PC/Laptop record created successfully"
        })),
    ))
}

/// PUT /api/pc-laptops/:id
async fn update_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(components): Json<PcComponents>,
) -> Result<Json<Value>> {
    debug!("Updating PC/Laptop record via API: {}", id);

    let asset = state.pc_laptop_service.update_asset(&id, components).await?;

    Ok(Json(json!({
        "success": true,
        "data": asset,
        "message": "PC/Laptop record updated successfully"
    })))
}

/// DELETE /api/pc-laptops/:id
async fn delete_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.pc_laptop_service.delete_asset(&id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "PC/Laptop record deleted successfully"
    })))
}
