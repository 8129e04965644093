use crate::{
    error::Result,
    models::{CreateItAccountRequest, ItAccount},
    services::{api_client::ApiClient, dashboard::Dashboard, notification_store::NotificationStore},
};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Finishes the IT setup for a pending notification.
///
/// The notification is marked processed only after the backend accepted the
/// new account. A failed create leaves it pending so the operator can retry.
#[derive(Clone)]
pub struct SetupFlow {
    api: ApiClient,
    store: Arc<NotificationStore>,
    dashboard: Option<Arc<Dashboard>>,
}

impl SetupFlow {
    pub fn new(api: ApiClient, store: Arc<NotificationStore>) -> Self {
        Self {
            api,
            store,
            dashboard: None,
        }
    }

    pub fn with_dashboard(mut self, dashboard: Arc<Dashboard>) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    pub async fn complete_setup(
        &self,
        notification_id: &str,
        request: CreateItAccountRequest,
    ) -> Result<ItAccount> {
        request.validate()?;

        let account = self.api.create_it_account(&request).await?;
        info!(
            "IT account {} created for {} ({})",
            account.system_id, account.employee_name, account.employee_id
        );

        // 账号已经存在于后端，标记失败时由 has_account 对账兜底
        if let Err(e) = self.store.mark_processed(notification_id) {
            warn!(
                "IT account created but notification {} could not be marked processed: {}",
                notification_id, e
            );
        }

        if let Some(dashboard) = &self.dashboard {
            dashboard.request_refresh();
        }

        Ok(account)
    }
}
