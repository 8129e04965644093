use crate::{
    error::{AppError, Result},
    models::department::*,
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

const TABLE: &str = "department";

#[derive(Clone)]
pub struct DepartmentService {
    db: Arc<Database>,
}

impl DepartmentService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>> {
        self.db.list(TABLE).await
    }

    pub async fn create_department(&self, request: CreateDepartmentRequest) -> Result<Department> {
        request.validate()?;
        let name = request.name.trim().to_string();
        debug!("Creating department: {}", name);

        let existing: Option<Department> = self.db.find_one(TABLE, "name", &name).await?;
        if existing.is_some() {
            return Err(AppError::conflict("Department with this name already exists"));
        }

        let department = Department {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
        };
        let created: Department = self.db.create(TABLE, &department.id, &department).await?;

        info!("Created department {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn delete_department(&self, id: &str) -> Result<Department> {
        self.db
            .delete_by_id(TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found("Department"))
    }
}
