use crate::{error::Result, models::ApiResponse, models::department::*, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route("/:id", delete(delete_department))
}

/// GET /api/departments
async fn list_departments(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Vec<Department>>>> {
    let departments = state.department_service.list_departments().await?;
    Ok(Json(ApiResponse::list(departments)))
}

/// POST /api/departments
async fn create_department(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let department = state.department_service.create_department(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": department,
            "message": "Department created successfully"
        })),
    ))
}

/// DELETE /api/departments/:id
async fn delete_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.department_service.delete_department(&id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Department deleted successfully"
    })))
}
