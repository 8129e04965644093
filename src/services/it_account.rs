use crate::{
    error::{AppError, Result},
    models::it_account::*,
    services::Database,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

const TABLE: &str = "it_account";

#[derive(Clone)]
pub struct ItAccountService {
    db: Arc<Database>,
}

impl ItAccountService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn list_accounts(&self) -> Result<Vec<ItAccount>> {
        debug!("Listing IT accounts");
        self.db.list(TABLE).await
    }

    pub async fn get_account(&self, id: &str) -> Result<ItAccount> {
        self.db
            .get_by_id(TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found("IT account"))
    }

    pub async fn create_account(&self, request: CreateItAccountRequest) -> Result<ItAccount> {
        request.validate()?;
        debug!(
            "Creating IT account {} for employee {}",
            request.system_id, request.employee_id
        );

        self.ensure_system_id_free(&request.system_id, None).await?;

        let id = Uuid::new_v4().to_string();
        let account = ItAccount::from_request(id.clone(), request, Utc::now());
        let created: ItAccount = self.db.create(TABLE, &id, &account).await?;

        info!("Created IT account {} ({})", created.id, created.system_id);
        Ok(created)
    }

    pub async fn update_account(
        &self,
        id: &str,
        request: UpdateItAccountRequest,
    ) -> Result<ItAccount> {
        request.validate()?;
        debug!("Updating IT account: {}", id);

        if let Some(system_id) = &request.system_id {
            self.ensure_system_id_free(system_id, Some(id)).await?;
        }

        let mut patch = serde_json::to_value(&request)?;
        patch["updatedAt"] = json!(Utc::now());

        self.db
            .merge(TABLE, id, &patch)
            .await?
            .ok_or_else(|| AppError::not_found("IT account"))
    }

    pub async fn delete_account(&self, id: &str) -> Result<ItAccount> {
        debug!("Deleting IT account: {}", id);

        let deleted: ItAccount = self
            .db
            .delete_by_id(TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found("IT account"))?;

        info!("Deleted IT account {} ({})", deleted.id, deleted.system_id);
        Ok(deleted)
    }

    /// systemId 在所有账号中唯一
    async fn ensure_system_id_free(&self, system_id: &str, except_id: Option<&str>) -> Result<()> {
        let existing: Option<ItAccount> = self.db.find_one(TABLE, "systemId", system_id).await?;
        match existing {
            Some(account) if Some(account.id.as_str()) != except_id => Err(AppError::conflict(
                "An IT account with this system ID already exists",
            )),
            _ => Ok(()),
        }
    }
}
