use crate::{error::Result, models::ApiResponse, models::it_account::*, state::AppState};
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
        .route("/", get(list_accounts).post(create_account))
        .route(
            "/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
}

/// List IT accounts, newest first
/// GET /api/it-accounts
async fn list_accounts(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Vec<ItAccount>>>> {
    let accounts = state.it_account_service.list_accounts().await?;
    Ok(Json(ApiResponse::list(accounts)))
}

/// GET /api/it-accounts/:id
async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ItAccount>>> {
    let account = state.it_account_service.get_account(&id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// Create an IT account
/// POST /api/it-accounts
async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateItAccountRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("Creating IT account for employee: {}", request.employee_id);

    let account = state.it_account_service.create_account(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": account,
            "message": "IT account created successfully"
        })),
    ))
}

/// Update an IT account
/// PUT /api/it-accounts/:id
async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateItAccountRequest>,
) -> Result<Json<ApiResponse<ItAccount>>> {
    let account = state.it_account_service.update_account(&id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        account,
        "IT account updated successfully",
    )))
}

/// Delete an IT account
/// DELETE /api/it-accounts/:id
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let account = state.it_account_service.delete_account(&id).await?;

    Ok(Json(json!({
        "success": true,
        "data": account,
        "message": "IT account deleted successfully"
    })))
}
