use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A locally persisted "IT needs to act on this employee" record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub table_number: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
}

/// Notification fields supplied by a producer; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub table_number: String,
    pub message: String,
    #[serde(default)]
    pub processed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewEmployee,
    EmployeeUpdate,
    EmployeeDeleted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::NewEmployee => "new_employee",
            NotificationType::EmployeeUpdate => "employee_update",
            NotificationType::EmployeeDeleted => "employee_deleted",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Notification {
    pub fn is_pending(&self) -> bool {
        !self.processed
    }
}

impl NewNotification {
    pub(crate) fn into_notification(self, id: String, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            notification_type: self.notification_type,
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            department: self.department,
            table_number: self.table_number,
            message: self.message,
            created_at,
            processed: self.processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_keys_and_snake_case_type() {
        let notification = Notification {
            id: "1718000000000".to_string(),
            notification_type: NotificationType::NewEmployee,
            employee_id: "e1".to_string(),
            employee_name: "Alice".to_string(),
            department: "Engineering".to_string(),
            table_number: "T12".to_string(),
            message: "hello".to_string(),
            created_at: "2024-06-10T08:00:00Z".parse().unwrap(),
            processed: false,
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "new_employee");
        assert_eq!(value["employeeName"], "Alice");
        assert_eq!(value["tableNumber"], "T12");
        assert_eq!(value["processed"], false);
    }

    #[test]
    fn missing_processed_flag_defaults_to_false() {
        let value = json!({
            "id": "42",
            "type": "employee_deleted",
            "employeeId": "e9",
            "employeeName": "Bob",
            "department": "Finance",
            "tableNumber": "",
            "message": "gone",
            "createdAt": "2024-06-10T08:00:00.000Z"
        });

        let notification: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(notification.notification_type, NotificationType::EmployeeDeleted);
        assert!(notification.is_pending());
    }
}
