use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::notification::Notification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItAccount {
    #[serde(alias = "_id")]
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub system_id: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub emails: Vec<EmailCredential>,
    #[serde(rename = "vitelGlobal", default)]
    pub telephony: TelephonyAccount,
    #[serde(rename = "lmPlayer", default)]
    pub license: SoftwareLicense,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_custom: Option<String>,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelephonyProvider {
    Vitel,
    Vonage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelephonyAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<TelephonyProvider>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftwareLicense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItAccountRequest {
    #[validate(length(min = 1, message = "employeeId is required"))]
    pub employee_id: String,
    #[validate(length(min = 1, message = "employeeName is required"))]
    pub employee_name: String,
    #[validate(length(min = 1, max = 100, message = "systemId must be 1 to 100 characters"))]
    pub system_id: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    #[validate]
    pub emails: Vec<EmailCredential>,
    #[serde(rename = "vitelGlobal", default)]
    pub telephony: TelephonyAccount,
    #[serde(rename = "lmPlayer", default)]
    pub license: SoftwareLicense,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItAccountRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub system_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_emails")]
    pub emails: Option<Vec<EmailCredential>>,
    #[serde(rename = "vitelGlobal", skip_serializing_if = "Option::is_none")]
    pub telephony: Option<TelephonyAccount>,
    #[serde(rename = "lmPlayer", skip_serializing_if = "Option::is_none")]
    pub license: Option<SoftwareLicense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// The IT account creation form, pre-filled from a pending notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItAccountDraft {
    pub notification_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub table_number: String,
}

impl From<&Notification> for ItAccountDraft {
    fn from(notification: &Notification) -> Self {
        Self {
            notification_id: notification.id.clone(),
            employee_id: notification.employee_id.clone(),
            employee_name: notification.employee_name.clone(),
            department: notification.department.clone(),
            table_number: notification.table_number.clone(),
        }
    }
}

impl ItAccountDraft {
    /// Completes the draft with the fields only IT can fill in.
    pub fn into_request(self, system_id: impl Into<String>) -> CreateItAccountRequest {
        CreateItAccountRequest {
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            system_id: system_id.into(),
            table_number: non_empty(self.table_number),
            department: non_empty(self.department),
            ..Default::default()
        }
    }
}

/// Every replacement email must satisfy the same rules as on create.
fn validate_emails(emails: &[EmailCredential]) -> Result<(), ValidationError> {
    if emails.iter().all(|email| email.validate().is_ok()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("email");
        error.message = Some("every email needs an address".into());
        Err(error)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl ItAccount {
    pub fn from_request(id: String, request: CreateItAccountRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            employee_id: request.employee_id,
            employee_name: request.employee_name,
            system_id: request.system_id,
            table_number: request.table_number,
            department: request.department,
            emails: request.emails,
            telephony: request.telephony,
            license: request.license,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        }
    }
}
