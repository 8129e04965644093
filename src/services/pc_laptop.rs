use crate::{
    error::{AppError, Result},
    models::pc_laptop::*,
    services::Database,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

const TABLE: &str = "pc_laptop";

#[derive(Clone)]
pub struct PcLaptopService {
    db: Arc<Database>,
}

impl PcLaptopService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn list_assets(&self) -> Result<Vec<PcLaptop>> {
        self.db.list(TABLE).await
    }

    pub async fn get_asset(&self, id: &str) -> Result<PcLaptop> {
        self.db
            .get_by_id(TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found("PC/Laptop record"))
    }

    pub async fn create_asset(&self, request: CreatePcLaptopRequest) -> Result<PcLaptop> {
        request.validate()?;
        debug!("Creating PC/Laptop record: {}", request.id);

        if self.db.get_by_id::<PcLaptop>(TABLE, &request.id).await?.is_some() {
            return Err(AppError::conflict("PC/Laptop with this ID already exists"));
        }

        let now = Utc::now();
        let asset = PcLaptop {
            id: request.id,
            components: request.components,
            created_at: now,
            updated_at: now,
        };
        self.db.create(TABLE, &asset.id, &asset).await
    }

    pub async fn update_asset(&self, id: &str, components: PcComponents) -> Result<PcLaptop> {
        debug!("Updating PC/Laptop record: {}", id);

        let mut patch = serde_json::to_value(&components)?;
        patch["updatedAt"] = json!(Utc::now());

        self.db
            .merge(TABLE, id, &patch)
            .await?
            .ok_or_else(|| AppError::not_found("PC/Laptop record"))
    }

    pub async fn delete_asset(&self, id: &str) -> Result<PcLaptop> {
        self.db
            .delete_by_id(TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found("PC/Laptop record"))
    }
}
