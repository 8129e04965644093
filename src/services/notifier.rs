use crate::{
    error::Result,
    models::notification::{NewNotification, Notification, NotificationType},
    services::notification_store::NotificationStore,
};
use std::sync::Arc;
use tracing::info;

/// Turns employee lifecycle events into queued IT notifications.
///
/// No validation or deduplication happens here: every call queues a new
/// record, even when one is already pending for the same employee.
#[derive(Clone)]
pub struct NotificationProducer {
    store: Arc<NotificationStore>,
}

impl NotificationProducer {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self { store }
    }

    pub fn notify_new_employee(
        &self,
        employee_id: &str,
        employee_name: &str,
        department: &str,
        table_number: &str,
    ) -> Result<Notification> {
        let message = format!(
            "New employee {} from {} ready for IT setup",
            employee_name, department
        );
        self.queue(
            NotificationType::NewEmployee,
            employee_id,
            employee_name,
            department,
            table_number,
            message,
        )
    }

    pub fn notify_employee_update(
        &self,
        employee_id: &str,
        employee_name: &str,
        department: &str,
        table_number: &str,
    ) -> Result<Notification> {
        let message = format!(
            "Employee {} from {} was updated, review IT setup",
            employee_name, department
        );
        self.queue(
            NotificationType::EmployeeUpdate,
            employee_id,
            employee_name,
            department,
            table_number,
            message,
        )
    }

    pub fn notify_employee_deleted(
        &self,
        employee_id: &str,
        employee_name: &str,
        department: &str,
        table_number: &str,
    ) -> Result<Notification> {
        let message = format!(
            "Employee {} from {} was removed, revoke IT access",
            employee_name, department
        );
        self.queue(
            NotificationType::EmployeeDeleted,
            employee_id,
            employee_name,
            department,
            table_number,
            message,
        )
    }

    fn queue(
        &self,
        notification_type: NotificationType,
        employee_id: &str,
        employee_name: &str,
        department: &str,
        table_number: &str,
        message: String,
    ) -> Result<Notification> {
        let notification = self.store.add(NewNotification {
            notification_type,
            employee_id: employee_id.to_string(),
            employee_name: employee_name.to_string(),
            department: department.to_string(),
            table_number: table_number.to_string(),
            message,
            processed: false,
        })?;

        info!(
            "Queued {} notification for {} ({})",
            notification_type, employee_name, employee_id
        );
        Ok(notification)
    }
}
